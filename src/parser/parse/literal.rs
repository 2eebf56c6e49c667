use crate::{
    chvalid::{xml_is_char, xml_is_pubid_char},
    error::{XmlError, XmlParserErrors},
    parser::{
        DtdParserCtxt,
        context::XML_MAX_TEXT_LENGTH,
        error::xml_fatal_err_msg,
    },
};

impl DtdParserCtxt<'_> {
    /// Parse an XML Literal
    ///
    /// ```text
    /// [11] SystemLiteral ::= ('"' [^"]* '"') | ("'" [^']* "'")
    /// ```
    #[doc(alias = "xmlParseSystemLiteral")]
    pub(crate) fn parse_system_literal(&mut self) -> Result<String, XmlError> {
        let stop = match self.consume_char_if(|c| c == '"' || c == '\'')? {
            Some(c) => c,
            None => {
                return Err(xml_fatal_err_msg!(
                    self,
                    XmlParserErrors::XmlErrLiteralNotStarted,
                    "SystemLiteral \" or ' expected"
                ));
            }
        };

        // No reference of any kind is recognized inside the literal.
        let lexical_pe = self.lexical_pe;
        self.lexical_pe = false;
        let mut buf = String::new();
        let result = loop {
            match self.getc()? {
                Some(c) if c == stop => break Ok(buf),
                Some(c) if xml_is_char(c as u32) => {
                    buf.push(c);
                    if buf.len() > XML_MAX_TEXT_LENGTH {
                        break Err(xml_fatal_err_msg!(
                            self,
                            XmlParserErrors::XmlErrNameTooLong,
                            "SystemLiteral"
                        ));
                    }
                }
                _ => {
                    break Err(xml_fatal_err_msg!(
                        self,
                        XmlParserErrors::XmlErrLiteralNotFinished,
                        "Unfinished SystemLiteral"
                    ));
                }
            }
        };
        self.lexical_pe = lexical_pe;
        result
    }

    /// Parse an XML public literal
    ///
    /// ```text
    /// [12] PubidLiteral ::= '"' PubidChar* '"' | "'" (PubidChar - "'") * "'"
    /// ```
    #[doc(alias = "xmlParsePubidLiteral")]
    pub(crate) fn parse_pubid_literal(&mut self) -> Result<String, XmlError> {
        let stop = match self.consume_char_if(|c| c == '"' || c == '\'')? {
            Some(c) => c,
            None => {
                return Err(xml_fatal_err_msg!(
                    self,
                    XmlParserErrors::XmlErrLiteralNotStarted,
                    "PubidLiteral \" or ' expected"
                ));
            }
        };

        let lexical_pe = self.lexical_pe;
        self.lexical_pe = false;
        let mut buf = String::new();
        let result = loop {
            match self.getc()? {
                Some(c) if c == stop => break Ok(buf),
                Some(c) if xml_is_pubid_char(c as u32) => {
                    buf.push(c);
                    if buf.len() > XML_MAX_TEXT_LENGTH {
                        break Err(xml_fatal_err_msg!(
                            self,
                            XmlParserErrors::XmlErrNameTooLong,
                            "Public ID"
                        ));
                    }
                }
                _ => {
                    break Err(xml_fatal_err_msg!(
                        self,
                        XmlParserErrors::XmlErrLiteralNotFinished,
                        "Unfinished PubidLiteral"
                    ));
                }
            }
        };
        self.lexical_pe = lexical_pe;
        result
    }

    /// Parse an External ID or a Public ID
    ///
    /// # Note
    /// Productions [75] and [83] interact badly since [75] can generate
    /// 'PUBLIC' S PubidLiteral S SystemLiteral
    ///
    /// ```text
    /// [75] ExternalID ::= 'SYSTEM' S SystemLiteral | 'PUBLIC' S PubidLiteral S SystemLiteral
    /// [83] PublicID ::= 'PUBLIC' S PubidLiteral
    /// ```
    ///
    /// With `strict` set, only [75] is accepted; otherwise a lone
    /// PublicID is allowed, as in notation declarations.
    #[doc(alias = "xmlParseExternalID")]
    pub(crate) fn parse_external_id(
        &mut self,
        strict: bool,
    ) -> Result<(Option<String>, Option<String>), XmlError> {
        if self.peek("SYSTEM")? {
            self.require_whitespace("after 'SYSTEM'")?;
            let uri = self.parse_system_literal()?;
            return Ok((None, Some(uri)));
        }
        if self.peek("PUBLIC")? {
            self.require_whitespace("after 'PUBLIC'")?;
            let public_id = self.parse_pubid_literal()?;
            if strict {
                // We don't handle [83] so "S SystemLiteral" is required.
                self.require_whitespace("after the Public Identifier")?;
            } else {
                // We handle [83]: return immediately if no system
                // literal follows.
                if self.skip_blanks()? == 0 {
                    return Ok((Some(public_id), None));
                }
                if !matches!(self.peek_char()?, Some('"') | Some('\'')) {
                    return Ok((Some(public_id), None));
                }
            }
            let uri = self.parse_system_literal()?;
            return Ok((Some(public_id), Some(uri)));
        }
        Ok((None, None))
    }
}
