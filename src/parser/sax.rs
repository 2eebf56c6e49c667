//! The listener contract the grammar engine emits into, plus the shared
//! locator callbacks can query at any time.

use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use crate::error::XmlError;

/// Content-model class of an element declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XmlElementTypeVal {
    XmlElementTypeEmpty,
    XmlElementTypeAny,
    XmlElementTypeMixed,
    XmlElementTypeElement,
}

/// Repetition suffix of a content particle or group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XmlElementContentOccur {
    /// no suffix
    XmlElementContentOnce,
    /// `?`
    XmlElementContentOpt,
    /// `*`
    XmlElementContentMult,
    /// `+`
    XmlElementContentPlus,
}

/// Connector chosen for one parenthesis level of a children model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XmlElementContentConnector {
    /// `,`
    XmlElementContentSeq,
    /// `|`
    XmlElementContentOr,
}

/// Declared type of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XmlAttributeType {
    XmlAttributeCDATA,
    XmlAttributeID,
    XmlAttributeIDREF,
    XmlAttributeIDREFS,
    XmlAttributeEntity,
    XmlAttributeEntities,
    XmlAttributeNmtoken,
    XmlAttributeNmtokens,
    XmlAttributeEnumeration,
    XmlAttributeNotation,
}

/// Default declaration of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XmlAttributeDefault {
    XmlAttributeNone,
    XmlAttributeRequired,
    XmlAttributeImplied,
    XmlAttributeFixed,
}

/// Current position of the parse, shared with the handler.
///
/// The parser updates the cells before every callback, so a handler can
/// read the location of the event it is processing at any time.
#[derive(Debug, Default)]
pub struct DtdLocator {
    line: Cell<u32>,
    column: Cell<u32>,
    public_id: RefCell<Option<String>>,
    system_id: RefCell<Option<String>>,
}

impl DtdLocator {
    #[doc(alias = "getLineNumber")]
    pub fn line(&self) -> u32 {
        self.line.get()
    }

    #[doc(alias = "getColumnNumber")]
    pub fn column(&self) -> u32 {
        self.column.get()
    }

    #[doc(alias = "getPublicId")]
    pub fn public_id(&self) -> Option<String> {
        self.public_id.borrow().clone()
    }

    #[doc(alias = "getSystemId")]
    pub fn system_id(&self) -> Option<String> {
        self.system_id.borrow().clone()
    }

    pub(crate) fn update(
        &self,
        line: u32,
        column: u32,
        public_id: Option<&str>,
        system_id: Option<&str>,
    ) {
        self.line.set(line);
        self.column.set(column);
        *self.public_id.borrow_mut() = public_id.map(|s| s.to_string());
        *self.system_id.borrow_mut() = system_id.map(|s| s.to_string());
    }
}

/// Receiver of the structural event stream.
///
/// Every method has a no-op default so handlers implement only what they
/// care about. Events arrive in document order; diagnostics arrive
/// through `warning`/`error`/`fatal_error` and are never swallowed.
#[allow(unused_variables)]
pub trait DtdHandler {
    /// Called once before any other event with the shared locator.
    fn set_document_locator(&mut self, locator: Rc<DtdLocator>) {}

    fn start_dtd(&mut self) {}
    fn end_dtd(&mut self) {}

    /// An ELEMENT declaration opens for `name`.
    fn start_content_model(&mut self, name: &str, typ: XmlElementTypeVal) {}
    /// A named particle inside a children model.
    fn child_element(&mut self, name: &str, occur: XmlElementContentOccur) {}
    /// The connector chosen at the current group level.
    fn connector(&mut self, connector: XmlElementContentConnector) {}
    /// A nested parenthesis group opens.
    fn start_model_group(&mut self) {}
    /// The current parenthesis group closes, with its repetition suffix.
    fn end_model_group(&mut self, occur: XmlElementContentOccur) {}
    /// A named child inside a mixed model.
    fn mixed_element(&mut self, name: &str) {}
    fn end_content_model(&mut self, name: &str, typ: XmlElementTypeVal) {}

    fn attribute_decl(
        &mut self,
        elem: &str,
        name: &str,
        typ: XmlAttributeType,
        default: XmlAttributeDefault,
        default_value: Option<&str>,
        enumeration: &[String],
    ) {
    }

    fn internal_general_entity_decl(&mut self, name: &str, value: &str) {}
    fn external_general_entity_decl(
        &mut self,
        name: &str,
        public_id: Option<&str>,
        system_id: &str,
    ) {
    }
    fn unparsed_entity_decl(
        &mut self,
        name: &str,
        public_id: Option<&str>,
        system_id: &str,
        notation_name: &str,
    ) {
    }

    fn notation_decl(&mut self, name: &str, public_id: Option<&str>, system_id: Option<&str>) {}

    fn comment(&mut self, content: &str) {}
    fn processing_instruction(&mut self, target: &str, data: Option<&str>) {}

    fn warning(&mut self, error: &XmlError) {}
    fn error(&mut self, error: &XmlError) {}
    fn fatal_error(&mut self, error: &XmlError) {}
}

/// Handler that records every event as one line of text.
///
/// This is the workhorse of the test suite and of `edtdlint --events`:
/// event streams become comparable strings.
#[derive(Default)]
pub struct EventCollector {
    pub events: Vec<String>,
    pub diagnostics: Vec<XmlError>,
    pub locator: Option<Rc<DtdLocator>>,
}

impl EventCollector {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, event: String) {
        self.events.push(event);
    }
}

fn occur_str(occur: XmlElementContentOccur) -> &'static str {
    match occur {
        XmlElementContentOccur::XmlElementContentOnce => "",
        XmlElementContentOccur::XmlElementContentOpt => "?",
        XmlElementContentOccur::XmlElementContentMult => "*",
        XmlElementContentOccur::XmlElementContentPlus => "+",
    }
}

fn type_str(typ: XmlElementTypeVal) -> &'static str {
    match typ {
        XmlElementTypeVal::XmlElementTypeEmpty => "EMPTY",
        XmlElementTypeVal::XmlElementTypeAny => "ANY",
        XmlElementTypeVal::XmlElementTypeMixed => "MIXED",
        XmlElementTypeVal::XmlElementTypeElement => "CHILDREN",
    }
}

impl DtdHandler for EventCollector {
    fn set_document_locator(&mut self, locator: Rc<DtdLocator>) {
        self.locator = Some(locator);
    }

    fn start_dtd(&mut self) {
        self.push("startDTD".to_string());
    }

    fn end_dtd(&mut self) {
        self.push("endDTD".to_string());
    }

    fn start_content_model(&mut self, name: &str, typ: XmlElementTypeVal) {
        self.push(format!("startContentModel({name}, {})", type_str(typ)));
    }

    fn child_element(&mut self, name: &str, occur: XmlElementContentOccur) {
        self.push(format!("childElement({name}{})", occur_str(occur)));
    }

    fn connector(&mut self, connector: XmlElementContentConnector) {
        let c = match connector {
            XmlElementContentConnector::XmlElementContentSeq => ',',
            XmlElementContentConnector::XmlElementContentOr => '|',
        };
        self.push(format!("connector({c})"));
    }

    fn start_model_group(&mut self) {
        self.push("startModelGroup".to_string());
    }

    fn end_model_group(&mut self, occur: XmlElementContentOccur) {
        self.push(format!("endModelGroup({})", occur_str(occur)));
    }

    fn mixed_element(&mut self, name: &str) {
        self.push(format!("mixedElement({name})"));
    }

    fn end_content_model(&mut self, name: &str, typ: XmlElementTypeVal) {
        self.push(format!("endContentModel({name}, {})", type_str(typ)));
    }

    fn attribute_decl(
        &mut self,
        elem: &str,
        name: &str,
        typ: XmlAttributeType,
        default: XmlAttributeDefault,
        default_value: Option<&str>,
        enumeration: &[String],
    ) {
        let typ = match typ {
            XmlAttributeType::XmlAttributeCDATA => "CDATA".to_string(),
            XmlAttributeType::XmlAttributeID => "ID".to_string(),
            XmlAttributeType::XmlAttributeIDREF => "IDREF".to_string(),
            XmlAttributeType::XmlAttributeIDREFS => "IDREFS".to_string(),
            XmlAttributeType::XmlAttributeEntity => "ENTITY".to_string(),
            XmlAttributeType::XmlAttributeEntities => "ENTITIES".to_string(),
            XmlAttributeType::XmlAttributeNmtoken => "NMTOKEN".to_string(),
            XmlAttributeType::XmlAttributeNmtokens => "NMTOKENS".to_string(),
            XmlAttributeType::XmlAttributeEnumeration => {
                format!("({})", enumeration.join("|"))
            }
            XmlAttributeType::XmlAttributeNotation => {
                format!("NOTATION ({})", enumeration.join("|"))
            }
        };
        let default = match default {
            XmlAttributeDefault::XmlAttributeNone => "",
            XmlAttributeDefault::XmlAttributeRequired => " #REQUIRED",
            XmlAttributeDefault::XmlAttributeImplied => " #IMPLIED",
            XmlAttributeDefault::XmlAttributeFixed => " #FIXED",
        };
        match default_value {
            Some(value) => self.push(format!("attributeDecl({elem}, {name}, {typ},{default} \"{value}\")")),
            None => self.push(format!("attributeDecl({elem}, {name}, {typ},{default})")),
        }
    }

    fn internal_general_entity_decl(&mut self, name: &str, value: &str) {
        self.push(format!("internalGeneralEntityDecl({name}, \"{value}\")"));
    }

    fn external_general_entity_decl(
        &mut self,
        name: &str,
        public_id: Option<&str>,
        system_id: &str,
    ) {
        self.push(format!(
            "externalGeneralEntityDecl({name}, {}, {system_id})",
            public_id.unwrap_or("-")
        ));
    }

    fn unparsed_entity_decl(
        &mut self,
        name: &str,
        public_id: Option<&str>,
        system_id: &str,
        notation_name: &str,
    ) {
        self.push(format!(
            "unparsedEntityDecl({name}, {}, {system_id}, {notation_name})",
            public_id.unwrap_or("-")
        ));
    }

    fn notation_decl(&mut self, name: &str, public_id: Option<&str>, system_id: Option<&str>) {
        self.push(format!(
            "notationDecl({name}, {}, {})",
            public_id.unwrap_or("-"),
            system_id.unwrap_or("-")
        ));
    }

    fn comment(&mut self, content: &str) {
        self.push(format!("comment({content})"));
    }

    fn processing_instruction(&mut self, target: &str, data: Option<&str>) {
        self.push(format!("processingInstruction({target}, {})", data.unwrap_or("")));
    }

    fn warning(&mut self, error: &XmlError) {
        self.diagnostics.push(error.clone());
    }

    fn error(&mut self, error: &XmlError) {
        self.diagnostics.push(error.clone());
    }

    fn fatal_error(&mut self, error: &XmlError) {
        self.diagnostics.push(error.clone());
    }
}
