//! Logical 5250 key codes and the static key sequence tables
//!
//! A logical key is the normalized event handed to the session layer,
//! independent of the raw bytes that produced it. The two tables here are
//! the raw material for the key map built at decoder init: a termcap-style
//! capability table (sequences resolved from the device at runtime) and a
//! fixed vt100 fallback table covering Ctrl and ESC introducer sequences.

/// ASCII value of Ctrl plus the given letter, e.g. `ctrl(b'X')`.
pub const fn ctrl(c: u8) -> u8 {
    c - 0x40
}

/// Escape introducer for the vt100 sequences.
pub const ESC: u8 = 0x1b;
/// Ctrl-G doubles as an alternate escape introducer.
pub const CTRL_G: u8 = ctrl(b'G');
/// Ctrl-Q terminates key processing for the session.
pub const QUIT_BYTE: u8 = ctrl(b'Q');
/// ASCII DEL.
pub const DEL: u8 = 0x7f;

/// Logical key codes produced by the key decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCode {
    Enter,
    Newline,
    Backtab,
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,
    F13,
    F14,
    F15,
    F16,
    F17,
    F18,
    F19,
    F20,
    F21,
    F22,
    F23,
    F24,
    Left,
    Right,
    Up,
    Down,
    RollDn,
    RollUp,
    Backspace,
    Home,
    End,
    Insert,
    Delete,
    Reset,
    Print,
    Help,
    SysReq,
    Clear,
    Refresh,
    FieldExit,
    TestReq,
    Toggle,
    Erase,
    Attention,
    Duplicate,
    FieldMinus,
    FieldPlus,
    PrevField,
    NextField,
    FieldHome,
    Exec,
    Memo,
    /// A byte that matched no sequence in the table; delivered raw.
    Char(u8),
}

/// Capability-derived mappings: logical key paired with the termcap
/// capability name whose sequence triggers it. Resolved against the
/// device's [`crate::caps::TermCaps`] provider at decoder init; entries
/// the device does not report are skipped.
pub(crate) const CAP_KEYS: &[(KeyCode, &str)] = &[
    (KeyCode::Enter, "@8"),
    (KeyCode::Enter, "cr"),
    (KeyCode::Backtab, "kB"),
    (KeyCode::F1, "k1"),
    (KeyCode::F2, "k2"),
    (KeyCode::F3, "k3"),
    (KeyCode::F4, "k4"),
    (KeyCode::F5, "k5"),
    (KeyCode::F6, "k6"),
    (KeyCode::F7, "k7"),
    (KeyCode::F8, "k8"),
    (KeyCode::F9, "k9"),
    (KeyCode::F10, "k;"),
    (KeyCode::F11, "F1"),
    (KeyCode::F12, "F2"),
    (KeyCode::F13, "F3"),
    (KeyCode::F14, "F4"),
    (KeyCode::F15, "F5"),
    (KeyCode::F16, "F6"),
    (KeyCode::F17, "F7"),
    (KeyCode::F18, "F8"),
    (KeyCode::F19, "F9"),
    (KeyCode::F20, "FA"),
    (KeyCode::F21, "FB"),
    (KeyCode::F22, "FC"),
    (KeyCode::F23, "FD"),
    (KeyCode::F24, "FE"),
    (KeyCode::Left, "kl"),
    (KeyCode::Right, "kr"),
    (KeyCode::Up, "ku"),
    (KeyCode::Down, "kd"),
    (KeyCode::RollDn, "kP"),
    (KeyCode::RollUp, "kN"),
    (KeyCode::Backspace, "kb"),
    (KeyCode::Home, "kh"),
    (KeyCode::End, "@7"),
    (KeyCode::Insert, "kI"),
    (KeyCode::Delete, "kD"),
    (KeyCode::Print, "%9"),
    (KeyCode::Help, "%1"),
    (KeyCode::Clear, "kC"),
    (KeyCode::Refresh, "&2"),
    (KeyCode::FieldExit, "@9"),
];

/// Fixed vt100 fallback sequences: Ctrl strings, one multi-byte DEL
/// sequence, and the ESC introducer group. The decoder also materializes
/// a Ctrl-G variant of every ESC-introduced entry so the sequences work
/// on terminals where ESC is swallowed.
pub(crate) const VT100_KEYS: &[(KeyCode, &[u8])] = &[
    // Ctrl strings
    (KeyCode::Attention, &[ctrl(b'A')]),
    (KeyCode::RollDn, &[ctrl(b'B')]),
    (KeyCode::SysReq, &[ctrl(b'C')]),
    (KeyCode::RollUp, &[ctrl(b'D')]),
    (KeyCode::Erase, &[ctrl(b'E')]),
    (KeyCode::RollUp, &[ctrl(b'F')]),
    (KeyCode::FieldExit, &[ctrl(b'K')]),
    (KeyCode::Refresh, &[ctrl(b'L')]),
    (KeyCode::Home, &[ctrl(b'O')]),
    (KeyCode::Print, &[ctrl(b'P')]),
    (KeyCode::Reset, &[ctrl(b'R')]),
    (KeyCode::Memo, &[ctrl(b'S')]),
    (KeyCode::TestReq, &[ctrl(b'T')]),
    (KeyCode::RollDn, &[ctrl(b'U')]),
    (KeyCode::Exec, &[ctrl(b'W')]),
    (KeyCode::FieldPlus, &[ctrl(b'X')]),
    // ASCII DEL is reported inconsistently by termcaps; match the full
    // \E[3~ sequence instead.
    (KeyCode::Delete, b"\x1b[3~"),
    // ESC strings
    (KeyCode::F1, b"\x1b1"),
    (KeyCode::F2, b"\x1b2"),
    (KeyCode::F3, b"\x1b3"),
    (KeyCode::F4, b"\x1b4"),
    (KeyCode::F5, b"\x1b5"),
    (KeyCode::F6, b"\x1b6"),
    (KeyCode::F7, b"\x1b7"),
    (KeyCode::F8, b"\x1b8"),
    (KeyCode::F9, b"\x1b9"),
    (KeyCode::F10, b"\x1b0"),
    (KeyCode::F11, b"\x1b-"),
    (KeyCode::F12, b"\x1b="),
    (KeyCode::F13, b"\x1b!"),
    (KeyCode::F14, b"\x1b@"),
    (KeyCode::F15, b"\x1b#"),
    (KeyCode::F16, b"\x1b$"),
    (KeyCode::F17, b"\x1b%"),
    (KeyCode::F18, b"\x1b^"),
    (KeyCode::F19, b"\x1b&"),
    (KeyCode::F20, b"\x1b*"),
    (KeyCode::F21, b"\x1b("),
    (KeyCode::F22, b"\x1b)"),
    (KeyCode::F23, b"\x1b_"),
    (KeyCode::F24, b"\x1b+"),
    (KeyCode::Attention, b"\x1bA"),
    (KeyCode::Clear, b"\x1bC"),
    (KeyCode::Duplicate, b"\x1bD"),
    (KeyCode::Help, b"\x1bH"),
    (KeyCode::Insert, b"\x1bI"),
    (KeyCode::Refresh, b"\x1bL"),
    (KeyCode::FieldMinus, b"\x1bM"),
    (KeyCode::Newline, b"\x1bN"),
    (KeyCode::Print, b"\x1bP"),
    (KeyCode::Reset, b"\x1bR"),
    (KeyCode::SysReq, b"\x1bS"),
    (KeyCode::Toggle, b"\x1bT"),
    (KeyCode::FieldExit, b"\x1bX"),
    (KeyCode::Newline, &[ESC, 0x0a]),
    (KeyCode::Newline, &[ESC, 0x0d]),
    (KeyCode::Insert, &[ESC, DEL]),
    (KeyCode::NextField, &[ESC, ctrl(b'U')]),
    (KeyCode::PrevField, &[ESC, ctrl(b'H')]),
    (KeyCode::FieldHome, &[ESC, ctrl(b'F')]),
];
