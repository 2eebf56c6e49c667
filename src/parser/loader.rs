//! External entity resolution and byte-to-character decoding.

use std::fs;

use encoding_rs::{Encoding, UTF_8};

use crate::{
    error::{XmlError, XmlParserErrors},
    parser::{
        DtdParserCtxt,
        error::{xml_err_msg_str, xml_fatal_err_msg, xml_warning_msg},
    },
};
use crate::entity::XmlEntity;

/// An already-opened input: identifiers plus raw bytes or decoded text.
#[derive(Debug, Default, Clone)]
pub struct InputSource {
    pub public_id: Option<String>,
    pub system_id: Option<String>,
    /// Raw bytes still in need of encoding detection.
    pub bytes: Option<Vec<u8>>,
    /// Already-decoded characters; takes precedence over `bytes`.
    pub content: Option<String>,
}

impl InputSource {
    pub fn from_bytes(system_id: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            system_id: Some(system_id.into()),
            bytes: Some(bytes),
            ..Self::default()
        }
    }

    pub fn from_content(system_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            system_id: Some(system_id.into()),
            content: Some(content.into()),
            ..Self::default()
        }
    }
}

/// Resolution collaborator mapping identifiers to input sources.
///
/// Returning `None` sends the parser down its fallback path, which
/// treats the system identifier as a URI to open directly.
pub trait EntityResolver {
    #[doc(alias = "resolveEntity")]
    fn resolve(&mut self, public_id: Option<&str>, system_id: &str) -> Option<InputSource>;
}

/// The default resolver never intercepts anything; every entity goes
/// through the filesystem fallback.
#[derive(Debug, Default)]
pub struct DefaultResolver;

impl EntityResolver for DefaultResolver {
    fn resolve(&mut self, _public_id: Option<&str>, _system_id: &str) -> Option<InputSource> {
        None
    }
}

/// Outcome of loading one external entity: decoded characters with the
/// text declaration already stripped.
pub(crate) struct LoadedEntity {
    pub content: String,
    pub public_id: Option<String>,
    pub system_id: Option<String>,
}

/// Scan a text declaration at the start of an external entity.
///
/// ```text
/// [77] TextDecl ::= '<?xml' VersionInfo? EncodingDecl S? '?>'
/// ```
///
/// Returns the byte offset just past `?>` plus the declared version and
/// encoding, or `None` when the content does not open with a text
/// declaration.
pub(crate) fn parse_text_decl(content: &str) -> Option<(usize, Option<String>, Option<String>)> {
    let rest = content.strip_prefix("<?xml")?;
    if !rest.starts_with([' ', '\t', '\r', '\n']) {
        return None;
    }
    let end = content.find("?>")?;
    let mut version = None;
    let mut encoding = None;
    let mut decl = content[5..end].trim_start();
    while !decl.is_empty() {
        let eq = decl.find('=')?;
        let name = decl[..eq].trim_end();
        decl = decl[eq + 1..].trim_start();
        let quote = decl.chars().next()?;
        if quote != '"' && quote != '\'' {
            return None;
        }
        let close = decl[1..].find(quote)?;
        let value = &decl[1..1 + close];
        match name {
            "version" => version = Some(value.to_string()),
            "encoding" => encoding = Some(value.to_string()),
            _ => return None,
        }
        decl = decl[close + 2..].trim_start();
    }
    Some((end + 2, version, encoding))
}

/// Pick the encoding to try first: a declared label found by scanning
/// the ASCII-compatible prefix, UTF-8 otherwise. BOM sniffing inside
/// `encoding_rs` still overrides the guess.
fn guess_encoding(bytes: &[u8]) -> &'static Encoding {
    let prefix_len = bytes.len().min(128);
    let prefix: String = bytes[..prefix_len]
        .iter()
        .map(|&b| if b.is_ascii() { b as char } else { '\u{FFFD}' })
        .collect();
    if let Some((_, _, Some(label))) = parse_text_decl(&prefix) {
        if let Some(encoding) = Encoding::for_label(label.as_bytes()) {
            return encoding;
        }
    }
    UTF_8
}

impl DtdParserCtxt<'_> {
    /// Resolve and load one external entity: resolver first, filesystem
    /// fallback second, then decoding and text-declaration stripping.
    pub(crate) fn load_external(
        &mut self,
        public_id: Option<&str>,
        system_id: &str,
    ) -> Result<LoadedEntity, XmlError> {
        let source = match self.resolver.resolve(public_id, system_id) {
            Some(source) => {
                if source.system_id.is_none() {
                    // The resolver gave us content but dropped the
                    // identifier diagnostics depend on; repair it.
                    xml_warning_msg!(
                        self,
                        XmlParserErrors::XmlWarIOMissingSystemID,
                        "Resolved entity is missing a system identifier, using '{}'",
                        system_id
                    );
                }
                source
            }
            None => match fs::read(system_id) {
                Ok(bytes) => InputSource::from_bytes(system_id, bytes),
                Err(_) => {
                    return Err(xml_fatal_err_msg!(
                        self,
                        XmlParserErrors::XmlIOLoadError,
                        "failed to load external entity \"{}\"",
                        system_id
                    ));
                }
            },
        };
        let system_id = source
            .system_id
            .clone()
            .unwrap_or_else(|| system_id.to_string());
        let public_id = source
            .public_id
            .clone()
            .or_else(|| public_id.map(|p| p.to_string()));

        let (decoded, detected) = match (source.content, source.bytes) {
            (Some(content), _) => (content, None),
            (None, Some(bytes)) => {
                let guess = guess_encoding(&bytes);
                let (text, used, malformed) = guess.decode(&bytes);
                if malformed {
                    return Err(xml_fatal_err_msg!(
                        self,
                        XmlParserErrors::XmlIOEncoder,
                        "Input conversion failed for entity \"{}\"",
                        system_id
                    ));
                }
                (text.into_owned(), Some(used))
            }
            (None, None) => (String::new(), None),
        };

        let content = match parse_text_decl(&decoded) {
            Some((offset, _, declared)) => {
                if let Some(label) = declared {
                    match Encoding::for_label(label.as_bytes()) {
                        Some(declared_enc) => {
                            if detected.is_some_and(|used| used != declared_enc) {
                                xml_warning_msg!(
                                    self,
                                    XmlParserErrors::XmlWarIOEncodingMismatch,
                                    "Declared encoding '{}' does not match the detected stream encoding",
                                    label
                                );
                            }
                        }
                        None => {
                            xml_err_msg_str!(
                                self,
                                XmlParserErrors::XmlErrUnknownEncoding,
                                "Unsupported encoding '{}'",
                                label
                            );
                        }
                    }
                }
                decoded[offset..].to_string()
            }
            None => decoded,
        };

        Ok(LoadedEntity {
            content,
            public_id,
            system_id: Some(system_id),
        })
    }

    /// Load the decoded content of an external entity declaration.
    pub(crate) fn load_external_entity_content(
        &mut self,
        entity: &XmlEntity,
    ) -> Result<String, XmlError> {
        let XmlEntity::External {
            public_id,
            system_id,
            ..
        } = entity
        else {
            return Ok(String::new());
        };
        let (public_id, system_id) = (public_id.clone(), system_id.clone());
        let loaded = self.load_external(public_id.as_deref(), &system_id)?;
        Ok(loaded.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_decl_extracts_version_and_encoding() {
        let (offset, version, encoding) =
            parse_text_decl("<?xml version=\"1.0\" encoding='ISO-8859-1'?><!ELEMENT a EMPTY>")
                .unwrap();
        assert_eq!(version.as_deref(), Some("1.0"));
        assert_eq!(encoding.as_deref(), Some("ISO-8859-1"));
        assert!(
            "<?xml version=\"1.0\" encoding='ISO-8859-1'?><!ELEMENT a EMPTY>"[offset..]
                .starts_with("<!ELEMENT")
        );
    }

    #[test]
    fn pi_with_xml_prefix_is_not_a_text_decl() {
        assert!(parse_text_decl("<?xml-stylesheet href='a'?>").is_none());
        assert!(parse_text_decl("<!ELEMENT a EMPTY>").is_none());
    }

    #[test]
    fn encoding_guess_reads_the_declared_label() {
        let bytes = b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?><!ENTITY e \"\xE9\">";
        assert_eq!(guess_encoding(bytes), encoding_rs::WINDOWS_1252);
    }
}
