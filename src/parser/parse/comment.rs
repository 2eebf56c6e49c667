use crate::{
    chvalid::xml_is_char,
    error::{XmlError, XmlParserErrors},
    parser::{DtdParserCtxt, context::XML_MAX_TEXT_LENGTH, error::xml_fatal_err_msg},
};

impl DtdParserCtxt<'_> {
    /// Parse a comment, with `<!--` already consumed. `--` is only
    /// allowed as part of the closing `-->`.
    ///
    /// ```text
    /// [15] Comment ::= '<!--' ((Char - '-') | ('-' (Char - '-')))* '-->'
    /// ```
    #[doc(alias = "xmlParseComment")]
    pub(crate) fn parse_comment(&mut self) -> Result<(), XmlError> {
        let lexical_pe = self.lexical_pe;
        self.lexical_pe = false;
        let result = self.parse_comment_inner();
        self.lexical_pe = lexical_pe;
        result
    }

    fn parse_comment_inner(&mut self) -> Result<(), XmlError> {
        let mut buf = String::new();
        loop {
            let Some(c) = self.getc()? else {
                return Err(xml_fatal_err_msg!(
                    self,
                    XmlParserErrors::XmlErrCommentNotFinished,
                    "Comment not terminated"
                ));
            };
            if c == '-' {
                match self.getc()? {
                    Some('-') => {
                        if !self.peek(">")? {
                            return Err(xml_fatal_err_msg!(
                                self,
                                XmlParserErrors::XmlErrHyphenInComment,
                                "Double hyphen within comment"
                            ));
                        }
                        self.sync_locator();
                        self.handler.comment(&buf);
                        return Ok(());
                    }
                    Some(d) => {
                        buf.push('-');
                        self.ungetc(d);
                        continue;
                    }
                    None => {
                        return Err(xml_fatal_err_msg!(
                            self,
                            XmlParserErrors::XmlErrCommentNotFinished,
                            "Comment not terminated"
                        ));
                    }
                }
            }
            if !xml_is_char(c as u32) {
                return Err(xml_fatal_err_msg!(
                    self,
                    XmlParserErrors::XmlErrInvalidChar,
                    "Invalid character in comment"
                ));
            }
            buf.push(c);
            if buf.len() > XML_MAX_TEXT_LENGTH {
                return Err(xml_fatal_err_msg!(
                    self,
                    XmlParserErrors::XmlErrResourceLimit,
                    "comment too long"
                ));
            }
        }
    }
}
