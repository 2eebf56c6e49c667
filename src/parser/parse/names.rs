use crate::{
    chvalid::{xml_is_name_char, xml_is_name_start_char},
    error::{XmlError, XmlParserErrors},
    parser::{
        DtdParserCtxt,
        context::XML_MAX_NAME_LENGTH,
        error::xml_fatal_err_msg,
    },
};

impl DtdParserCtxt<'_> {
    /// Parse an XML name.
    ///
    /// ```text
    /// [4] NameChar ::= Letter | Digit | '.' | '-' | '_' | ':' | CombiningChar | Extender
    ///
    /// [5] Name ::= (Letter | '_' | ':') (NameChar)*
    /// ```
    ///
    /// Returns `None` when the current character cannot start a name.
    #[doc(alias = "xmlParseName")]
    pub(crate) fn parse_name(&mut self) -> Result<Option<String>, XmlError> {
        let Some(c) = self.consume_char_if(xml_is_name_start_char)? else {
            return Ok(None);
        };
        let mut buf = String::new();
        buf.push(c);
        while let Some(c) = self.consume_char_if(xml_is_name_char)? {
            buf.push(c);
            if buf.len() > XML_MAX_NAME_LENGTH {
                return Err(xml_fatal_err_msg!(
                    self,
                    XmlParserErrors::XmlErrNameTooLong,
                    "Name"
                ));
            }
        }
        Ok(Some(buf))
    }

    /// Parse a name that the grammar requires at this point.
    pub(crate) fn parse_name_req(&mut self, ctx: &str) -> Result<String, XmlError> {
        match self.parse_name()? {
            Some(name) => Ok(name),
            None => Err(xml_fatal_err_msg!(
                self,
                XmlParserErrors::XmlErrNameRequired,
                "Name expected {}",
                ctx
            )),
        }
    }

    /// Parse an XML Nmtoken.
    ///
    /// ```text
    /// [7] Nmtoken ::= (NameChar)+
    /// ```
    #[doc(alias = "xmlParseNmtoken")]
    pub(crate) fn parse_nmtoken(&mut self) -> Result<Option<String>, XmlError> {
        let mut buf = String::new();
        while let Some(c) = self.consume_char_if(xml_is_name_char)? {
            buf.push(c);
            if buf.len() > XML_MAX_NAME_LENGTH {
                return Err(xml_fatal_err_msg!(
                    self,
                    XmlParserErrors::XmlErrNameTooLong,
                    "NmToken"
                ));
            }
        }
        Ok((!buf.is_empty()).then_some(buf))
    }
}
