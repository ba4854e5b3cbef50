//! The closed vocabulary of block keywords.
//!
//! The scanner only needs to know, for each keyword, whether the following
//! line carries a subtype token and how the block is terminated. Field
//! semantics live entirely in the variant grammars.

/// How the scanner finds the end of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminator {
    /// The block runs until the next keyword line.
    NextKeyword,
    /// The line after the keyword holds the number of lines that follow.
    Counted,
    /// The block runs until (and including) a closing sentinel line.
    Sentinel(&'static str),
    /// The block runs to the end of the file.
    EndOfFile,
}

/// Scanner-level facts about one keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeywordInfo {
    pub token: &'static str,
    pub has_subtype: bool,
    pub terminator: Terminator,
}

const fn plain(token: &'static str) -> KeywordInfo {
    KeywordInfo {
        token,
        has_subtype: false,
        terminator: Terminator::NextKeyword,
    }
}

const fn with_subtype(token: &'static str) -> KeywordInfo {
    KeywordInfo {
        token,
        has_subtype: true,
        terminator: Terminator::NextKeyword,
    }
}

/// The sentinel line closing the header section.
pub const END_GENERAL: &str = "END GENERAL";

/// The sentinel line closing a `VARIABLES` block.
pub const END_VARIABLES: &str = "END VARIABLES";

static KEYWORDS: &[KeywordInfo] = &[
    // Blocks with special termination.
    KeywordInfo {
        token: "COMMENT",
        has_subtype: false,
        terminator: Terminator::Counted,
    },
    KeywordInfo {
        token: "VARIABLES",
        has_subtype: false,
        terminator: Terminator::Sentinel(END_VARIABLES),
    },
    KeywordInfo {
        token: "GISINFO",
        has_subtype: false,
        terminator: Terminator::EndOfFile,
    },
    // Units with a subtype line.
    with_subtype("RIVER"),
    with_subtype("BRIDGE"),
    with_subtype("CONDUIT"),
    with_subtype("SLUICE"),
    with_subtype("ORIFICE"),
    with_subtype("CULVERT"),
    with_subtype("OUTFALL"),
    with_subtype("JUNCTION"),
    with_subtype("FLOODPLAIN"),
    // Everything else.
    plain("INITIAL CONDITIONS"),
    plain("QTBDY"),
    plain("HTBDY"),
    plain("QHBDY"),
    plain("REFHBDY"),
    plain("SPILL"),
    plain("BLOCKAGE"),
    plain("2DCELL"),
    plain("ABSTRACTION"),
    plain("AIR VESSEL"),
    plain("BERNOULLI"),
    plain("BREACH"),
    plain("CHECK VALVE"),
    plain("CONPUMP"),
    plain("CONVALVE"),
    plain("CRUMP"),
    plain("FEHBDY"),
    plain("FLAT-V WEIR"),
    plain("FLOOD RELIEF"),
    plain("FLOW CONTROL"),
    plain("FRQSIM"),
    plain("FSRBDY"),
    plain("FSSR16BDY"),
    plain("GATED WEIR"),
    plain("GAUGE"),
    plain("GERRBDY"),
    plain("HBDY"),
    plain("INTERPOLATE"),
    plain("INVERTED SYPHON"),
    plain("LABYRINTH WEIR"),
    plain("LATERAL"),
    plain("LDPUMP"),
    plain("LOSS"),
    plain("MANHOLE"),
    plain("NCBDY"),
    plain("NCDBDY"),
    plain("NOTWEIR"),
    plain("NOZZLE"),
    plain("OCPUMP"),
    plain("PIPE"),
    plain("POND"),
    plain("QH CONTROL"),
    plain("QRATING"),
    plain("REBDY"),
    plain("REFH2BDY"),
    plain("REPLICATE"),
    plain("RESERVOIR"),
    plain("RNWEIR"),
    plain("SCSBDY"),
    plain("SCWEIR"),
    plain("SYPHON"),
    plain("TIDAL"),
    plain("TIDBDY"),
    plain("WEIR"),
];

/// Looks up a keyword token, ignoring case.
pub fn lookup(token: &str) -> Option<&'static KeywordInfo> {
    let token = token.trim();
    KEYWORDS
        .iter()
        .find(|info| info.token.eq_ignore_ascii_case(token))
}

/// All known keyword tokens.
pub fn tokens() -> impl Iterator<Item = &'static str> {
    KEYWORDS.iter().map(|info| info.token)
}
