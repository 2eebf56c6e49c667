//! The recursive-descent grammar engine: one submodule per group of
//! productions, the markup dispatcher and the public entry points.

mod comment;
mod dtd;
mod element;
mod entity;
mod literal;
mod names;
mod pi;

use crate::{
    error::{XmlError, XmlParserErrors},
    parser::{
        DtdParserCtxt,
        error::xml_fatal_err_msg,
        input::{ParserInput, ParserInputKind},
    },
};

impl DtdParserCtxt<'_> {
    /// Dispatch one markup declaration.
    ///
    /// ```text
    /// [29] markupdecl ::= elementdecl | AttlistDecl | EntityDecl |
    ///                     NotationDecl | PI | Comment
    /// ```
    #[doc(alias = "xmlParseMarkupDecl")]
    pub(crate) fn parse_markup_decl(&mut self) -> Result<(), XmlError> {
        if self.peek("<!--")? {
            return self.parse_comment();
        }
        if self.peek("<?")? {
            return self.parse_pi();
        }
        if self.peek("<!ELEMENT")? {
            return self.parse_element_decl();
        }
        if self.peek("<!ATTLIST")? {
            return self.parse_attribute_list_decl();
        }
        if self.peek("<!ENTITY")? {
            return self.parse_entity_decl();
        }
        if self.peek("<!NOTATION")? {
            return self.parse_notation_decl();
        }
        if self.peek("<![")? {
            if self.in_internal_subset && self.input().is_some_and(|input| input.is_document()) {
                return Err(xml_fatal_err_msg!(
                    self,
                    XmlParserErrors::XmlErrCondsecInvalid,
                    "Conditional sections are not allowed in the internal subset"
                ));
            }
            return self.parse_conditional_section(1);
        }
        Err(xml_fatal_err_msg!(
            self,
            XmlParserErrors::XmlErrExtSubsetNotFinished,
            "markup declaration expected"
        ))
    }

    /// Loop over the declarations of one subset until its base input is
    /// exhausted.
    ///
    /// ```text
    /// [28b] intSubset     ::= (markupdecl | PEReference | S)*
    /// [31]  extSubsetDecl ::= (markupdecl | conditionalSect | S)*
    /// ```
    ///
    /// Parameter entities behave differently in the two subsets: in the
    /// internal subset they are recognized only between declarations,
    /// while external-subset text (and any expanded parameter entity)
    /// runs with the lexical splice turned on.
    #[doc(alias = "xmlParseInternalSubset")]
    #[doc(alias = "xmlParseExternalSubset")]
    fn parse_subset_content(&mut self, internal: bool) -> Result<(), XmlError> {
        loop {
            self.lexical_pe = !internal || self.inputs.len() > 1;
            self.skip_blanks()?;
            let Some(c) = self.peek_char()? else {
                break;
            };
            // peek_char may have popped exhausted expansions.
            self.lexical_pe = !internal || self.inputs.len() > 1;
            if c == '%' && !self.lexical_pe {
                let _ = self.getc_raw()?;
                let Some(name) = self.parse_name()? else {
                    return Err(xml_fatal_err_msg!(
                        self,
                        XmlParserErrors::XmlErrPERefNoName,
                        "PEReference: no name"
                    ));
                };
                if self.consume_char_if(|c| c == ';')?.is_none() {
                    return Err(xml_fatal_err_msg!(
                        self,
                        XmlParserErrors::XmlErrPERefSemicolMissing,
                        "PEReference: expecting ';' after '%{}'",
                        name
                    ));
                }
                self.parameter_entity_include(&name)?;
                continue;
            }
            self.parse_markup_decl()?;
        }
        Ok(())
    }

    /// Parse a DTD from its two optional parts: internal subset text
    /// first, then the external subset named by its identifiers.
    ///
    /// Runs the deferred validity sweep once both subsets are in, then
    /// tears down every per-parse table whatever the outcome.
    pub fn parse_dtd(
        &mut self,
        internal_subset: Option<&str>,
        external_id: Option<(Option<&str>, &str)>,
    ) -> Result<(), XmlError> {
        let result = self.parse_dtd_inner(internal_subset, external_id);
        self.reset();
        result
    }

    fn parse_dtd_inner(
        &mut self,
        internal_subset: Option<&str>,
        external_id: Option<(Option<&str>, &str)>,
    ) -> Result<(), XmlError> {
        self.handler.set_document_locator(self.locator());
        self.handler.start_dtd();
        if let Some(text) = internal_subset {
            let id = self.next_input_id();
            self.input_push(ParserInput::new(
                text,
                ParserInputKind::Document,
                None,
                None,
                None,
                false,
                id,
            ));
            self.in_internal_subset = true;
            self.parse_subset_content(true)?;
            while self.pop_input().is_some() {}
            self.in_internal_subset = false;
        }
        if let Some((public_id, system_id)) = external_id {
            let loaded = self.load_external(public_id, system_id)?;
            let id = self.next_input_id();
            self.input_push(ParserInput::new(
                &loaded.content,
                ParserInputKind::Document,
                None,
                loaded.public_id,
                loaded.system_id,
                false,
                id,
            ));
            self.parse_subset_content(false)?;
            while self.pop_input().is_some() {}
        }
        self.validate_dtd_final();
        self.handler.end_dtd();
        Ok(())
    }

    /// Parse internal subset text alone, as found between the brackets
    /// of a DOCTYPE declaration.
    pub fn parse_internal_subset(&mut self, text: &str) -> Result<(), XmlError> {
        self.parse_dtd(Some(text), None)
    }

    /// Parse already-decoded external subset text from memory.
    pub fn parse_memory(
        &mut self,
        content: &str,
        system_id: Option<&str>,
    ) -> Result<(), XmlError> {
        let result = self.parse_memory_inner(content, system_id);
        self.reset();
        result
    }

    fn parse_memory_inner(
        &mut self,
        content: &str,
        system_id: Option<&str>,
    ) -> Result<(), XmlError> {
        self.handler.set_document_locator(self.locator());
        self.handler.start_dtd();
        let id = self.next_input_id();
        self.input_push(ParserInput::new(
            content,
            ParserInputKind::Document,
            None,
            None,
            system_id.map(|s| s.to_string()),
            false,
            id,
        ));
        self.parse_subset_content(false)?;
        while self.pop_input().is_some() {}
        self.validate_dtd_final();
        self.handler.end_dtd();
        Ok(())
    }

    /// Parse the external subset named by `uri`, going through the
    /// entity resolver.
    pub fn parse_uri(&mut self, uri: &str) -> Result<(), XmlError> {
        self.parse_dtd(None, Some((None, uri)))
    }
}
