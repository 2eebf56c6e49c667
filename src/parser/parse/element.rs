//! Element declarations: EMPTY/ANY, mixed content and children content
//! models, streamed to the handler as the model is read.

use std::rc::Rc;

use crate::{
    error::{XmlError, XmlParserErrors},
    parser::{
        DtdParserCtxt,
        error::{xml_fatal_err_msg, xml_validity_error},
        sax::{XmlElementContentConnector, XmlElementContentOccur, XmlElementTypeVal},
    },
};

/// Nesting allowed in one children content model.
const MAX_CONTENT_DEPTH: usize = 256;

impl DtdParserCtxt<'_> {
    /// Parse an element declaration, with `<!ELEMENT` already consumed.
    ///
    /// ```text
    /// [45] elementdecl ::= '<!ELEMENT' S Name S contentspec S? '>'
    /// [46] contentspec ::= 'EMPTY' | 'ANY' | Mixed | children
    /// ```
    #[doc(alias = "xmlParseElementDecl")]
    pub(crate) fn parse_element_decl(&mut self) -> Result<(), XmlError> {
        let inputid = self.current_input_id();
        self.require_whitespace("after '<!ELEMENT'")?;
        let name = self.parse_name_req("in element declaration")?;
        let interned = self.intern(&name);
        if !self.declared_elements.insert(Rc::clone(&interned)) {
            // The model that follows is still parsed and forwarded; the
            // handler decides what to make of the second declaration.
            xml_validity_error!(
                self,
                XmlParserErrors::XmlDTDElemRedefined,
                "Redefinition of element {}",
                name
            );
        }
        self.require_whitespace("after the element name")?;

        if self.peek("EMPTY")? {
            self.sync_locator();
            self.handler
                .start_content_model(&name, XmlElementTypeVal::XmlElementTypeEmpty);
            self.handler
                .end_content_model(&name, XmlElementTypeVal::XmlElementTypeEmpty);
        } else if self.peek("ANY")? {
            self.sync_locator();
            self.handler
                .start_content_model(&name, XmlElementTypeVal::XmlElementTypeAny);
            self.handler
                .end_content_model(&name, XmlElementTypeVal::XmlElementTypeAny);
        } else if self.peek("(")? {
            let group_input = self.current_input_id();
            self.skip_blanks()?;
            if self.peek("#PCDATA")? {
                self.parse_mixed_content(&name, group_input)?;
            } else {
                self.sync_locator();
                self.handler
                    .start_content_model(&name, XmlElementTypeVal::XmlElementTypeElement);
                self.handler.start_model_group();
                self.parse_element_children(1, group_input)?;
                self.sync_locator();
                self.handler
                    .end_content_model(&name, XmlElementTypeVal::XmlElementTypeElement);
            }
        } else {
            return Err(xml_fatal_err_msg!(
                self,
                XmlParserErrors::XmlErrElemcontentNotStarted,
                "'EMPTY', 'ANY' or '(' expected in element declaration of {}",
                name
            ));
        }

        self.skip_blanks()?;
        if self.current_input_id() != inputid {
            return Err(xml_fatal_err_msg!(
                self,
                XmlParserErrors::XmlErrEntityBoundary,
                "Element declaration doesn't start and stop in the same entity"
            ));
        }
        if !self.peek(">")? {
            return Err(xml_fatal_err_msg!(
                self,
                XmlParserErrors::XmlErrGtRequired,
                "expected '>' at the end of element declaration of {}",
                name
            ));
        }
        Ok(())
    }

    /// Parse a mixed content model, with `(` S? `#PCDATA` consumed.
    ///
    /// ```text
    /// [51] Mixed ::= '(' S? '#PCDATA' (S? '|' S? Name)* S? ')*' |
    ///                '(' S? '#PCDATA' S? ')'
    /// ```
    ///
    /// A child named twice draws a validity error but is reported to the
    /// handler only once.
    #[doc(alias = "xmlParseElementMixedContentDecl")]
    pub(crate) fn parse_mixed_content(
        &mut self,
        elem: &str,
        group_input: u32,
    ) -> Result<(), XmlError> {
        self.sync_locator();
        self.handler
            .start_content_model(elem, XmlElementTypeVal::XmlElementTypeMixed);
        let mut children: Vec<String> = Vec::new();
        loop {
            self.skip_blanks()?;
            if self.peek(")")? {
                self.check_group_boundary(group_input);
                if !children.is_empty() && self.consume_char_if(|c| c == '*')?.is_none() {
                    return Err(xml_fatal_err_msg!(
                        self,
                        XmlParserErrors::XmlErrMixedNotFinished,
                        "Mixed content with children must end with ')*'"
                    ));
                }
                // '(#PCDATA)*' is legal too.
                if children.is_empty() {
                    self.consume_char_if(|c| c == '*')?;
                }
                self.sync_locator();
                self.handler
                    .end_content_model(elem, XmlElementTypeVal::XmlElementTypeMixed);
                return Ok(());
            }
            if !self.peek("|")? {
                return Err(xml_fatal_err_msg!(
                    self,
                    XmlParserErrors::XmlErrMixedNotStarted,
                    "'|' or ')*' expected in the mixed content of {}",
                    elem
                ));
            }
            self.skip_blanks()?;
            let child = self.parse_name_req("in mixed content declaration")?;
            if children.contains(&child) {
                xml_validity_error!(
                    self,
                    XmlParserErrors::XmlDTDContentError,
                    "Definition of {} has duplicate references to {}",
                    elem,
                    child
                );
            } else {
                self.sync_locator();
                self.handler.mixed_element(&child);
                children.push(child);
            }
        }
    }

    /// Parse one parenthesis level of a children content model, with the
    /// opening `(` consumed and its `start_model_group` already emitted.
    ///
    /// ```text
    /// [47] children ::= (choice | seq) ('?' | '*' | '+')?
    /// [48] cp       ::= (Name | choice | seq) ('?' | '*' | '+')?
    /// [49] choice   ::= '(' S? cp ( S? '|' S? cp )+ S? ')'
    /// [50] seq      ::= '(' S? cp ( S? ',' S? cp )* S? ')'
    /// ```
    ///
    /// Each level commits to one connector; reading the other one at the
    /// same level is fatal.
    #[doc(alias = "xmlParseElementChildrenContentDecl")]
    pub(crate) fn parse_element_children(
        &mut self,
        depth: usize,
        group_input: u32,
    ) -> Result<XmlElementContentOccur, XmlError> {
        if depth > MAX_CONTENT_DEPTH {
            return Err(xml_fatal_err_msg!(
                self,
                XmlParserErrors::XmlErrResourceLimit,
                "Content model nesting depth exceeded"
            ));
        }
        let mut connector: Option<XmlElementContentConnector> = None;
        loop {
            self.skip_blanks()?;
            if self.peek("(")? {
                let sub_input = self.current_input_id();
                self.sync_locator();
                self.handler.start_model_group();
                self.parse_element_children(depth + 1, sub_input)?;
            } else {
                let child = self.parse_name_req("in a children content model")?;
                let occur = self.parse_occurrence()?;
                self.sync_locator();
                self.handler.child_element(&child, occur);
            }
            self.skip_blanks()?;
            if self.peek(")")? {
                self.check_group_boundary(group_input);
                let occur = self.parse_occurrence()?;
                self.sync_locator();
                self.handler.end_model_group(occur);
                return Ok(occur);
            }
            let seen = match self.peek_char()? {
                Some(',') => XmlElementContentConnector::XmlElementContentSeq,
                Some('|') => XmlElementContentConnector::XmlElementContentOr,
                _ => {
                    return Err(xml_fatal_err_msg!(
                        self,
                        XmlParserErrors::XmlErrElemcontentNotFinished,
                        "',', '|' or ')' expected in a children content model"
                    ));
                }
            };
            match connector {
                None => connector = Some(seen),
                Some(committed) if committed != seen => {
                    let expected = match committed {
                        XmlElementContentConnector::XmlElementContentSeq => ',',
                        XmlElementContentConnector::XmlElementContentOr => '|',
                    };
                    return Err(xml_fatal_err_msg!(
                        self,
                        XmlParserErrors::XmlErrSeparatorRequired,
                        "'{}' expected, the separators of a group must all agree",
                        expected
                    ));
                }
                Some(_) => {}
            }
            let _ = self.getc()?;
            self.sync_locator();
            self.handler.connector(seen);
        }
    }

    /// Read an optional occurrence suffix.
    fn parse_occurrence(&mut self) -> Result<XmlElementContentOccur, XmlError> {
        Ok(
            match self.consume_char_if(|c| matches!(c, '?' | '*' | '+'))? {
                Some('?') => XmlElementContentOccur::XmlElementContentOpt,
                Some('*') => XmlElementContentOccur::XmlElementContentMult,
                Some('+') => XmlElementContentOccur::XmlElementContentPlus,
                _ => XmlElementContentOccur::XmlElementContentOnce,
            },
        )
    }

    /// A group must open and close in the same input entity; crossing
    /// the boundary is a validity error, not a well-formedness one, so
    /// the parse goes on.
    fn check_group_boundary(&mut self, group_input: u32) {
        if self.current_input_id() != group_input {
            xml_validity_error!(
                self,
                XmlParserErrors::XmlErrEntityBoundary,
                "Element content declaration doesn't start and stop in the same entity"
            );
        }
    }
}
