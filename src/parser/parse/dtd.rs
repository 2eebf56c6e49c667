//! Attribute list declarations, notation declarations and conditional
//! sections.

use crate::{
    chvalid::xml_is_char,
    error::{XmlError, XmlParserErrors},
    parser::{
        DtdParserCtxt,
        error::{xml_err_msg_str, xml_fatal_err_msg, xml_validity_error},
        sax::{XmlAttributeDefault, XmlAttributeType},
        valid::check_language_id,
    },
};

/// Nesting allowed for conditional sections.
const MAX_CONDSEC_DEPTH: usize = 256;

impl DtdParserCtxt<'_> {
    /// Parse an attribute list declaration, with `<!ATTLIST` already
    /// consumed.
    ///
    /// ```text
    /// [52] AttlistDecl ::= '<!ATTLIST' S Name AttDef* S? '>'
    /// [53] AttDef      ::= S Name S AttType S DefaultDecl
    /// ```
    ///
    /// The `attribute_decl` event fires for every definition, even one
    /// that drew a validity error, so handlers see the declaration the
    /// way the document author wrote it.
    #[doc(alias = "xmlParseAttributeListDecl")]
    pub(crate) fn parse_attribute_list_decl(&mut self) -> Result<(), XmlError> {
        let inputid = self.current_input_id();
        self.require_whitespace("after '<!ATTLIST'")?;
        let elem = self.parse_name_req("in ATTLIST declaration")?;
        loop {
            let blanks = self.skip_blanks()?;
            if self.peek(">")? {
                if self.current_input_id() != inputid {
                    return Err(xml_fatal_err_msg!(
                        self,
                        XmlParserErrors::XmlErrEntityBoundary,
                        "Attribute list declaration doesn't start and stop in the same entity"
                    ));
                }
                return Ok(());
            }
            if self.peek_char()?.is_none() {
                return Err(xml_fatal_err_msg!(
                    self,
                    XmlParserErrors::XmlErrAttlistNotFinished,
                    "attribute list of {} not terminated",
                    elem
                ));
            }
            if blanks == 0 {
                return Err(xml_fatal_err_msg!(
                    self,
                    XmlParserErrors::XmlErrSpaceRequired,
                    "Space required before the attribute name"
                ));
            }
            let name = self.parse_name_req("in attribute definition")?;
            self.require_whitespace("after the attribute name")?;
            let (typ, enumeration) = self.parse_attribute_type()?;
            self.require_whitespace("after the attribute type")?;
            let (default, value) = self.parse_default_decl()?;
            self.check_attribute_definition(&elem, &name, typ, default, value.as_deref(), &enumeration);
            self.sync_locator();
            self.handler
                .attribute_decl(&elem, &name, typ, default, value.as_deref(), &enumeration);
        }
    }

    /// Parse an attribute type.
    ///
    /// ```text
    /// [54] AttType        ::= StringType | TokenizedType | EnumeratedType
    /// [55] StringType     ::= 'CDATA'
    /// [56] TokenizedType  ::= 'ID' | 'IDREF' | 'IDREFS' | 'ENTITY' |
    ///                         'ENTITIES' | 'NMTOKEN' | 'NMTOKENS'
    /// [57] EnumeratedType ::= NotationType | Enumeration
    /// [58] NotationType   ::= 'NOTATION' S '(' S? Name (S? '|' S? Name)* S? ')'
    /// [59] Enumeration    ::= '(' S? Nmtoken (S? '|' S? Nmtoken)* S? ')'
    /// ```
    ///
    /// Longer keywords are tried first since `ID` is a prefix of
    /// `IDREF` and `IDREFS`.
    #[doc(alias = "xmlParseAttributeType")]
    pub(crate) fn parse_attribute_type(
        &mut self,
    ) -> Result<(XmlAttributeType, Vec<String>), XmlError> {
        if self.peek("CDATA")? {
            return Ok((XmlAttributeType::XmlAttributeCDATA, Vec::new()));
        }
        if self.peek("IDREFS")? {
            return Ok((XmlAttributeType::XmlAttributeIDREFS, Vec::new()));
        }
        if self.peek("IDREF")? {
            return Ok((XmlAttributeType::XmlAttributeIDREF, Vec::new()));
        }
        if self.peek("ID")? {
            return Ok((XmlAttributeType::XmlAttributeID, Vec::new()));
        }
        if self.peek("ENTITIES")? {
            return Ok((XmlAttributeType::XmlAttributeEntities, Vec::new()));
        }
        if self.peek("ENTITY")? {
            return Ok((XmlAttributeType::XmlAttributeEntity, Vec::new()));
        }
        if self.peek("NMTOKENS")? {
            return Ok((XmlAttributeType::XmlAttributeNmtokens, Vec::new()));
        }
        if self.peek("NMTOKEN")? {
            return Ok((XmlAttributeType::XmlAttributeNmtoken, Vec::new()));
        }
        if self.peek("NOTATION")? {
            self.require_whitespace("after 'NOTATION'")?;
            if !self.peek("(")? {
                return Err(xml_fatal_err_msg!(
                    self,
                    XmlParserErrors::XmlErrNotationNotStarted,
                    "'(' required after 'NOTATION'"
                ));
            }
            let tokens = self.parse_enumeration(true)?;
            for token in &tokens {
                let interned = self.intern(token);
                self.notations.reference(interned);
            }
            return Ok((XmlAttributeType::XmlAttributeNotation, tokens));
        }
        if self.peek("(")? {
            let tokens = self.parse_enumeration(false)?;
            return Ok((XmlAttributeType::XmlAttributeEnumeration, tokens));
        }
        Err(xml_fatal_err_msg!(
            self,
            XmlParserErrors::XmlErrAttlistNotStarted,
            "an attribute type is required"
        ))
    }

    /// Parse the token list of an enumerated type, with `(` consumed.
    /// Notation types enumerate Names, plain enumerations Nmtokens. A
    /// duplicated token is a validity error and is not listed twice.
    fn parse_enumeration(&mut self, names: bool) -> Result<Vec<String>, XmlError> {
        let mut tokens: Vec<String> = Vec::new();
        loop {
            self.skip_blanks()?;
            let token = if names {
                self.parse_name_req("in NOTATION enumeration")?
            } else {
                match self.parse_nmtoken()? {
                    Some(token) => token,
                    None => {
                        return Err(xml_fatal_err_msg!(
                            self,
                            XmlParserErrors::XmlErrNmtokenRequired,
                            "Nmtoken required in enumeration"
                        ));
                    }
                }
            };
            if tokens.contains(&token) {
                xml_validity_error!(
                    self,
                    XmlParserErrors::XmlDTDDupToken,
                    "standalone: attribute enumeration value token {} duplicated",
                    token
                );
            } else {
                tokens.push(token);
            }
            self.skip_blanks()?;
            if self.peek(")")? {
                return Ok(tokens);
            }
            if !self.peek("|")? {
                return Err(xml_fatal_err_msg!(
                    self,
                    XmlParserErrors::XmlErrAttlistNotFinished,
                    "'|' or ')' expected in enumeration"
                ));
            }
        }
    }

    /// Parse a default declaration.
    ///
    /// ```text
    /// [60] DefaultDecl ::= '#REQUIRED' | '#IMPLIED' |
    ///                      (('#FIXED' S)? AttValue)
    /// ```
    #[doc(alias = "xmlParseDefaultDecl")]
    pub(crate) fn parse_default_decl(
        &mut self,
    ) -> Result<(XmlAttributeDefault, Option<String>), XmlError> {
        if self.peek("#REQUIRED")? {
            return Ok((XmlAttributeDefault::XmlAttributeRequired, None));
        }
        if self.peek("#IMPLIED")? {
            return Ok((XmlAttributeDefault::XmlAttributeImplied, None));
        }
        let fixed = self.peek("#FIXED")?;
        if fixed {
            self.require_whitespace("after '#FIXED'")?;
        }
        let value = self.parse_att_value()?;
        let default = if fixed {
            XmlAttributeDefault::XmlAttributeFixed
        } else {
            XmlAttributeDefault::XmlAttributeNone
        };
        Ok((default, Some(value)))
    }

    /// Validity and bookkeeping checks on one attribute definition, run
    /// before the declaration is reported.
    fn check_attribute_definition(
        &mut self,
        elem: &str,
        name: &str,
        typ: XmlAttributeType,
        default: XmlAttributeDefault,
        value: Option<&str>,
        enumeration: &[String],
    ) {
        match typ {
            XmlAttributeType::XmlAttributeID => {
                match default {
                    XmlAttributeDefault::XmlAttributeFixed => {
                        xml_validity_error!(
                            self,
                            XmlParserErrors::XmlDTDIDFixed,
                            "ID attribute {} of {} can have no #FIXED default",
                            name,
                            elem
                        );
                    }
                    XmlAttributeDefault::XmlAttributeNone => {
                        xml_validity_error!(
                            self,
                            XmlParserErrors::XmlDTDAttributeDefault,
                            "ID attribute {} of {} must be #IMPLIED or #REQUIRED",
                            name,
                            elem
                        );
                    }
                    _ => {}
                }
                if let Some(value) = value {
                    let interned = self.intern(value);
                    if !self.ids.add_id(interned) {
                        xml_validity_error!(
                            self,
                            XmlParserErrors::XmlDTDIDRedefined,
                            "ID {} already defined",
                            value
                        );
                    }
                }
            }
            XmlAttributeType::XmlAttributeIDREF => {
                if let Some(value) = value {
                    let interned = self.intern(value);
                    self.ids.add_ref(interned);
                }
            }
            XmlAttributeType::XmlAttributeIDREFS => {
                if let Some(value) = value {
                    for idref in value.split_ascii_whitespace() {
                        let interned = self.intern(idref);
                        self.ids.add_ref(interned);
                    }
                }
            }
            _ => {}
        }
        if name == "xml:lang" {
            if let Some(value) = value {
                if !value.is_empty() && !check_language_id(value) {
                    xml_validity_error!(
                        self,
                        XmlParserErrors::XmlWarLangValue,
                        "Malformed value for xml:lang : {}",
                        value
                    );
                }
            }
        }
        if name == "xml:space" {
            let bad_token = enumeration
                .iter()
                .any(|token| token != "default" && token != "preserve");
            let bad_value =
                value.is_some_and(|value| value != "default" && value != "preserve");
            if bad_token || bad_value {
                xml_validity_error!(
                    self,
                    XmlParserErrors::XmlWarSpaceValue,
                    "Attribute xml:space: \"default\" or \"preserve\" expected"
                );
            }
        }
    }

    /// Parse a notation declaration, with `<!NOTATION` already consumed.
    ///
    /// ```text
    /// [82] NotationDecl ::= '<!NOTATION' S Name S (ExternalID | PublicID) S? '>'
    /// ```
    #[doc(alias = "xmlParseNotationDecl")]
    pub(crate) fn parse_notation_decl(&mut self) -> Result<(), XmlError> {
        let inputid = self.current_input_id();
        self.require_whitespace("after '<!NOTATION'")?;
        let name = self.parse_name_req("in NOTATION declaration")?;
        if name.contains(':') {
            xml_err_msg_str!(
                self,
                XmlParserErrors::XmlNsErrColon,
                "colons are forbidden from notation names '{}'",
                name
            );
        }
        self.require_whitespace("after the NOTATION name")?;
        let (public_id, system_id) = self.parse_external_id(false)?;
        if public_id.is_none() && system_id.is_none() {
            return Err(xml_fatal_err_msg!(
                self,
                XmlParserErrors::XmlErrNotationNotStarted,
                "'PUBLIC' or 'SYSTEM' required in NOTATION declaration"
            ));
        }
        let interned = self.intern(&name);
        if !self
            .notations
            .declare(interned, public_id.clone(), system_id.clone())
        {
            xml_validity_error!(
                self,
                XmlParserErrors::XmlDTDNotationRedefined,
                "Redefinition of notation {}",
                name
            );
        }
        self.sync_locator();
        self.handler
            .notation_decl(&name, public_id.as_deref(), system_id.as_deref());
        self.skip_blanks()?;
        if self.current_input_id() != inputid {
            return Err(xml_fatal_err_msg!(
                self,
                XmlParserErrors::XmlErrEntityBoundary,
                "Notation declaration doesn't start and stop in the same entity"
            ));
        }
        if !self.peek(">")? {
            return Err(xml_fatal_err_msg!(
                self,
                XmlParserErrors::XmlErrNotationNotFinished,
                "notation {} not terminated",
                name
            ));
        }
        Ok(())
    }

    /// Parse a conditional section, with `<![` already consumed. Only
    /// meaningful in the external subset or in an external parameter
    /// entity.
    ///
    /// ```text
    /// [61] conditionalSect   ::= includeSect | ignoreSect
    /// [62] includeSect       ::= '<![' S? 'INCLUDE' S? '[' extSubsetDecl ']]>'
    /// [63] ignoreSect        ::= '<![' S? 'IGNORE' S? '[' ignoreSectContents* ']]>'
    /// [64] ignoreSectContents ::= Ignore ('<![' ignoreSectContents ']]>' Ignore)*
    /// [65] Ignore            ::= Char* - (Char* ('<![' | ']]>') Char*)
    /// ```
    #[doc(alias = "xmlParseConditionalSections")]
    pub(crate) fn parse_conditional_section(&mut self, depth: usize) -> Result<(), XmlError> {
        if depth > MAX_CONDSEC_DEPTH {
            return Err(xml_fatal_err_msg!(
                self,
                XmlParserErrors::XmlErrResourceLimit,
                "Maximum conditional section nesting depth exceeded"
            ));
        }
        let inputid = self.current_input_id();
        self.skip_blanks()?;
        if self.peek("INCLUDE")? {
            self.skip_blanks()?;
            if self.current_input_id() != inputid {
                return Err(xml_fatal_err_msg!(
                    self,
                    XmlParserErrors::XmlErrEntityBoundary,
                    "All markup of the conditional section is not in the same entity"
                ));
            }
            if !self.peek("[")? {
                return Err(xml_fatal_err_msg!(
                    self,
                    XmlParserErrors::XmlErrCondsecInvalid,
                    "Expecting '[' after the INCLUDE keyword"
                ));
            }
            loop {
                self.skip_blanks()?;
                if self.peek("]]>")? {
                    if self.current_input_id() != inputid {
                        return Err(xml_fatal_err_msg!(
                            self,
                            XmlParserErrors::XmlErrEntityBoundary,
                            "All markup of the conditional section is not in the same entity"
                        ));
                    }
                    return Ok(());
                }
                if self.peek_char()?.is_none() {
                    return Err(xml_fatal_err_msg!(
                        self,
                        XmlParserErrors::XmlErrCondsecNotFinished,
                        "XML conditional section not closed"
                    ));
                }
                if self.peek("<![")? {
                    self.parse_conditional_section(depth + 1)?;
                } else {
                    self.parse_markup_decl()?;
                }
            }
        } else if self.peek("IGNORE")? {
            self.skip_blanks()?;
            if self.current_input_id() != inputid {
                return Err(xml_fatal_err_msg!(
                    self,
                    XmlParserErrors::XmlErrEntityBoundary,
                    "All markup of the conditional section is not in the same entity"
                ));
            }
            if !self.peek("[")? {
                return Err(xml_fatal_err_msg!(
                    self,
                    XmlParserErrors::XmlErrCondsecInvalid,
                    "Expecting '[' after the IGNORE keyword"
                ));
            }
            // The ignored contents are scanned raw: no parameter entity
            // is recognized, only the bracket nesting matters.
            let mut ignore_depth = 1usize;
            loop {
                match self.getc_raw()? {
                    None => {
                        return Err(xml_fatal_err_msg!(
                            self,
                            XmlParserErrors::XmlErrCondsecNotFinished,
                            "XML conditional section not closed"
                        ));
                    }
                    Some('<') if self.peek("![")? => ignore_depth += 1,
                    Some(']') if self.peek("]>")? => {
                        ignore_depth -= 1;
                        if ignore_depth == 0 {
                            if self.current_input_id() != inputid {
                                return Err(xml_fatal_err_msg!(
                                    self,
                                    XmlParserErrors::XmlErrEntityBoundary,
                                    "All markup of the conditional section is not in the same entity"
                                ));
                            }
                            return Ok(());
                        }
                    }
                    Some(c) if xml_is_char(c as u32) => {}
                    Some(_) => {
                        return Err(xml_fatal_err_msg!(
                            self,
                            XmlParserErrors::XmlErrInvalidChar,
                            "Invalid character in an ignored conditional section"
                        ));
                    }
                }
            }
        } else {
            Err(xml_fatal_err_msg!(
                self,
                XmlParserErrors::XmlErrCondsecInvalidKeyword,
                "Expecting 'INCLUDE' or 'IGNORE' in a conditional section"
            ))
        }
    }
}
