//! Error codes, severities, the positioned error record, and the
//! locale-aware message catalog used to render diagnostics.

use std::fmt;

/// Errors the DTD parser can generate.
macro_rules! impl_xml_parser_errors {
    ( $( $variant:ident $( = $default:literal )? ),* $(,)? ) => {
        #[repr(C)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum XmlParserErrors {
            $(
                $variant $( = $default )?
            ),*
        }

        impl XmlParserErrors {
            /// Stable message-catalog key for this code.
            pub fn as_code(&self) -> &'static str {
                match self {
                    $(
                        Self::$variant => stringify!($variant)
                    ),*
                }
            }
        }

        impl Default for XmlParserErrors {
            fn default() -> Self {
                Self::XmlErrOK
            }
        }
    };
}
impl_xml_parser_errors!(
    XmlErrOK = 0,
    XmlErrInternalError,           /* 1 */
    XmlErrDocumentEnd,             /* 2 */
    XmlErrInvalidHexCharRef,       /* 3 */
    XmlErrInvalidDecCharRef,       /* 4 */
    XmlErrInvalidCharRef,          /* 5 */
    XmlErrInvalidChar,             /* 6 */
    XmlErrEntityRefSemicolMissing, /* 7 */
    XmlErrPERefNoName,             /* 8 */
    XmlErrPERefSemicolMissing,     /* 9 */
    XmlErrUndeclaredEntity,        /* 10 */
    XmlWarUndeclaredEntity,        /* 11 */
    XmlErrUnknownEncoding,         /* 12 */
    XmlErrUnsupportedEncoding,     /* 13 */
    XmlErrEntityNotFinished,       /* 14 */
    XmlErrLtInAttribute,           /* 15 */
    XmlErrLiteralNotStarted,       /* 16 */
    XmlErrLiteralNotFinished,      /* 17 */
    XmlErrCommentNotFinished,      /* 18 */
    XmlErrPINotStarted,            /* 19 */
    XmlErrPINotFinished,           /* 20 */
    XmlErrNotationNotStarted,      /* 21 */
    XmlErrNotationNotFinished,     /* 22 */
    XmlErrAttlistNotStarted,       /* 23 */
    XmlErrAttlistNotFinished,      /* 24 */
    XmlErrMixedNotStarted,         /* 25 */
    XmlErrElemcontentNotStarted,   /* 26 */
    XmlErrElemcontentNotFinished,  /* 27 */
    XmlErrXMLDeclNotFinished,      /* 28 */
    XmlErrCondsecNotStarted,       /* 29 */
    XmlErrCondsecNotFinished,      /* 30 */
    XmlErrExtSubsetNotFinished,    /* 31 */
    XmlErrReservedXmlName,         /* 32 */
    XmlErrSpaceRequired,           /* 33 */
    XmlErrSeparatorRequired,       /* 34 */
    XmlErrNmtokenRequired,         /* 35 */
    XmlErrNameRequired,            /* 36 */
    XmlErrPCDATARequired,          /* 37 */
    XmlErrURIRequired,             /* 38 */
    XmlErrPubidRequired,           /* 39 */
    XmlErrGtRequired,              /* 40 */
    XmlErrCondsecInvalid,          /* 41 */
    XmlErrValueRequired,           /* 42 */
    XmlErrEntityCharError,         /* 43 */
    XmlErrEntityPEInternal,        /* 44 */
    XmlErrEntityLoop,              /* 45 */
    XmlErrEntityBoundary,          /* 46 */
    XmlErrURIFragment,             /* 47 */
    XmlErrCondsecInvalidKeyword,   /* 48 */
    XmlWarLangValue,               /* 49 */
    XmlWarSpaceValue,              /* 50 */
    XmlWarEntityRedefined,         /* 51 */
    XmlErrNameTooLong,             /* 52 */
    XmlErrEntityAmplification,     /* 53 */
    XmlErrResourceLimit,           /* 54 */
    XmlErrHyphenInComment,         /* 55 */
    XmlErrMixedNotFinished,        /* 56 */
    XmlErrEntityIsExternal,        /* 57 */
    XmlNsErrColon = 200,
    XmlIOLoadError = 300,
    XmlIOEncoder,                  /* 301 */
    XmlWarIOMissingSystemID,       /* 302 */
    XmlWarIOEncodingMismatch,      /* 303 */
    XmlDTDAttributeDefault = 500,
    XmlDTDAttributeValue,        /* 501 */
    XmlDTDContentError,          /* 502 */
    XmlDTDContentModel,          /* 503 */
    XmlDTDElemRedefined,         /* 504 */
    XmlDTDIDFixed,               /* 505 */
    XmlDTDIDRedefined,           /* 506 */
    XmlDTDMixedCorrupt,          /* 507 */
    XmlDTDNotationRedefined,     /* 508 */
    XmlDTDUnknownID,             /* 509 */
    XmlDTDUnknownNotation,       /* 510 */
    XmlDTDDupToken,              /* 511 */
);

impl XmlParserErrors {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::XmlErrOK)
    }
}

/// Severity taxonomy of the diagnostics.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum XmlErrorLevel {
    #[default]
    XmlErrNone,
    /// A simple warning.
    XmlErrWarning,
    /// A recoverable error (validity constraint violation).
    XmlErrError,
    /// A fatal error (well-formedness violation, parsing stops).
    XmlErrFatal,
}

impl fmt::Display for XmlErrorLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::XmlErrNone => write!(f, "none"),
            Self::XmlErrWarning => write!(f, "warning"),
            Self::XmlErrError => write!(f, "error"),
            Self::XmlErrFatal => write!(f, "fatal"),
        }
    }
}

/// What part of the library raised the diagnostic.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum XmlErrorDomain {
    #[default]
    XmlFromNone,
    /// The well-formedness layer of the DTD parser.
    XmlFromParser,
    /// The validity layer.
    XmlFromDTD,
    /// Entity resolution and stream decoding.
    XmlFromIO,
}

/// A positioned diagnostic record.
///
/// Every diagnostic, whatever its severity, carries the location of the
/// input entity that was on top of the stack when the problem was found.
#[derive(Debug, Default, Clone)]
pub struct XmlError {
    pub domain: XmlErrorDomain,
    pub code: XmlParserErrors,
    pub level: XmlErrorLevel,
    pub message: String,
    pub public_id: Option<String>,
    pub system_id: Option<String>,
    pub line: u32,
    pub col: u32,
}

impl fmt::Display for XmlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.system_id.as_deref() {
            Some(sysid) => write!(f, "{}:{}:{}: ", sysid, self.line, self.col)?,
            None => write!(f, "{}:{}: ", self.line, self.col)?,
        }
        write!(f, "{}: {}", self.level, self.message.trim_end())
    }
}

impl std::error::Error for XmlError {}

/// Locale-aware message rendering collaborator.
///
/// The parser formats a readable fallback message itself; when a catalog
/// is installed, the rendered text for a code/argument pair comes from
/// `format` instead, so diagnostics can be localized without touching the
/// engine.
pub trait MessageCatalog {
    /// Choose the best supported locale from the client's ordered
    /// preference list, `None` if nothing matches.
    fn choose_locale(&self, preferences: &[&str]) -> Option<String>;

    /// Render the message for `code`, substituting `{0}`, `{1}`, ... with
    /// `args`. Returns `None` when the catalog has no template for the
    /// code, in which case the caller keeps its fallback message.
    fn format(&self, code: XmlParserErrors, args: &[&str]) -> Option<String>;
}

/// Built-in English catalog.
#[derive(Debug, Default)]
pub struct DefaultCatalog;

fn substitute(template: &str, args: &[&str]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(pos) = rest.find('{') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        if let Some(end) = rest.find('}') {
            if let Ok(index) = rest[1..end].parse::<usize>() {
                out.push_str(args.get(index).copied().unwrap_or(""));
                rest = &rest[end + 1..];
                continue;
            }
        }
        out.push('{');
        rest = &rest[1..];
    }
    out.push_str(rest);
    out
}

impl MessageCatalog for DefaultCatalog {
    fn choose_locale(&self, preferences: &[&str]) -> Option<String> {
        preferences
            .iter()
            .find(|pref| {
                let primary = pref.split(['-', '_']).next().unwrap_or(pref);
                primary.eq_ignore_ascii_case("en")
            })
            .map(|pref| pref.to_string())
    }

    fn format(&self, code: XmlParserErrors, args: &[&str]) -> Option<String> {
        use XmlParserErrors::*;
        let template = match code {
            XmlErrSpaceRequired => "Space required {0}",
            XmlErrNameRequired => "Name expected {0}",
            XmlErrGtRequired => "'>' expected {0}",
            XmlErrUndeclaredEntity => "Entity '{0}' not defined",
            XmlWarUndeclaredEntity => "PEReference: %{0}; not found",
            XmlErrEntityLoop => "Detected an entity reference loop",
            XmlErrEntityAmplification => "Maximum entity amplification factor exceeded",
            XmlDTDUnknownID => "IDREF attribute value '{0}' references an unknown ID",
            XmlDTDUnknownNotation => "Notation '{0}' is referenced but never declared",
            XmlDTDDupToken => "standalone: attribute enumeration value token {0} duplicated",
            XmlDTDElemRedefined => "Redefinition of element {0}",
            _ => return None,
        };
        Some(substitute(template, args))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitution_is_positional() {
        assert_eq!(substitute("a {0} b {1} c {0}", &["x", "y"]), "a x b y c x");
        assert_eq!(substitute("no args", &[]), "no args");
        assert_eq!(substitute("stray { brace", &[]), "stray { brace");
    }

    #[test]
    fn locale_negotiation_prefers_client_order() {
        let catalog = DefaultCatalog;
        assert_eq!(
            catalog.choose_locale(&["fr-FR", "en-US", "en"]),
            Some("en-US".to_string())
        );
        assert_eq!(catalog.choose_locale(&["fr", "de"]), None);
    }

    #[test]
    fn display_carries_position() {
        let err = XmlError {
            domain: XmlErrorDomain::XmlFromParser,
            code: XmlParserErrors::XmlErrNameRequired,
            level: XmlErrorLevel::XmlErrFatal,
            message: "Name expected\n".to_string(),
            public_id: None,
            system_id: Some("sample.dtd".to_string()),
            line: 3,
            col: 7,
        };
        assert_eq!(err.to_string(), "sample.dtd:3:7: fatal: Name expected");
    }
}
