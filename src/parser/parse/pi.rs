use crate::{
    chvalid::xml_is_char,
    error::{XmlError, XmlParserErrors},
    parser::{
        DtdParserCtxt,
        context::XML_MAX_TEXT_LENGTH,
        error::{xml_err_msg_str, xml_fatal_err_msg},
    },
};

impl DtdParserCtxt<'_> {
    /// Parse a processing instruction, with `<?` already consumed.
    ///
    /// ```text
    /// [16] PI       ::= '<?' PITarget (S (Char* - (Char* '?>' Char*)))? '?>'
    /// [17] PITarget ::= Name - (('X' | 'x') ('M' | 'm') ('L' | 'l'))
    /// ```
    #[doc(alias = "xmlParsePI")]
    pub(crate) fn parse_pi(&mut self) -> Result<(), XmlError> {
        let lexical_pe = self.lexical_pe;
        self.lexical_pe = false;
        let result = self.parse_pi_inner();
        self.lexical_pe = lexical_pe;
        result
    }

    fn parse_pi_inner(&mut self) -> Result<(), XmlError> {
        let target = self.parse_name_req("in processing instruction")?;
        if target.eq_ignore_ascii_case("xml") {
            xml_err_msg_str!(
                self,
                XmlParserErrors::XmlErrReservedXmlName,
                "the processing instruction target '{}' is reserved",
                target
            );
        }
        if self.peek("?>")? {
            self.sync_locator();
            self.handler.processing_instruction(&target, None);
            return Ok(());
        }
        self.require_whitespace("after the PI target")?;
        let mut buf = String::new();
        loop {
            let Some(c) = self.getc()? else {
                return Err(xml_fatal_err_msg!(
                    self,
                    XmlParserErrors::XmlErrPINotFinished,
                    "processing instruction {} never ends",
                    target
                ));
            };
            if c == '?' {
                if self.peek(">")? {
                    self.sync_locator();
                    self.handler.processing_instruction(&target, Some(&buf));
                    return Ok(());
                }
                buf.push('?');
                continue;
            }
            if !xml_is_char(c as u32) {
                return Err(xml_fatal_err_msg!(
                    self,
                    XmlParserErrors::XmlErrInvalidChar,
                    "Invalid character in processing instruction"
                ));
            }
            buf.push(c);
            if buf.len() > XML_MAX_TEXT_LENGTH {
                return Err(xml_fatal_err_msg!(
                    self,
                    XmlParserErrors::XmlErrResourceLimit,
                    "processing instruction too long"
                ));
            }
        }
    }
}
