//! End-to-end parses over in-memory subsets and the fixture files under
//! test/dtds/, checking event streams and diagnostics.

use edtd::{
    error::{XmlError, XmlErrorLevel, XmlParserErrors},
    parser::{
        DtdHandler, DtdParserCtxt, EventCollector, XmlAttributeDefault, XmlAttributeType,
        XmlElementContentConnector, XmlElementContentOccur, XmlElementTypeVal,
    },
};

struct Outcome {
    events: Vec<String>,
    diagnostics: Vec<XmlError>,
    result: Result<(), XmlError>,
    well_formed: bool,
    valid: bool,
}

impl Outcome {
    fn has_code(&self, code: XmlParserErrors) -> bool {
        self.diagnostics.iter().any(|d| d.code == code)
    }
}

fn parse_internal(text: &str) -> Outcome {
    let mut collector = EventCollector::new();
    let (result, well_formed, valid) = {
        let mut ctxt = DtdParserCtxt::new(&mut collector);
        let result = ctxt.parse_internal_subset(text);
        (result, ctxt.well_formed, ctxt.valid)
    };
    Outcome {
        events: collector.events,
        diagnostics: collector.diagnostics,
        result,
        well_formed,
        valid,
    }
}

fn parse_external(text: &str) -> Outcome {
    let mut collector = EventCollector::new();
    let (result, well_formed, valid) = {
        let mut ctxt = DtdParserCtxt::new(&mut collector);
        let result = ctxt.parse_memory(text, Some("test.dtd"));
        (result, ctxt.well_formed, ctxt.valid)
    };
    Outcome {
        events: collector.events,
        diagnostics: collector.diagnostics,
        result,
        well_formed,
        valid,
    }
}

#[test]
fn empty_element_declaration() {
    let out = parse_internal("<!ELEMENT foo EMPTY>");
    assert!(out.result.is_ok());
    assert_eq!(
        out.events,
        vec![
            "startDTD",
            "startContentModel(foo, EMPTY)",
            "endContentModel(foo, EMPTY)",
            "endDTD",
        ]
    );
    assert!(out.well_formed && out.valid);
}

#[test]
fn any_element_declaration() {
    let out = parse_internal("<!ELEMENT foo ANY>");
    assert!(out.events.contains(&"startContentModel(foo, ANY)".to_string()));
    assert!(out.events.contains(&"endContentModel(foo, ANY)".to_string()));
}

#[test]
fn character_reference_survives_double_expansion() {
    let out = parse_internal(concat!(
        "<!ENTITY amp2 \"&#38;\">\n",
        "<!ATTLIST foo bar CDATA \"x&amp2;y\">\n",
    ));
    assert!(out.result.is_ok(), "{:?}", out.result);
    assert!(
        out.events
            .contains(&"internalGeneralEntityDecl(amp2, \"&#38;\")".to_string()),
        "{:?}",
        out.events
    );
    assert!(
        out.events
            .contains(&"attributeDecl(foo, bar, CDATA, \"x&y\")".to_string()),
        "{:?}",
        out.events
    );
}

#[test]
fn predefined_entities_expand_to_data() {
    let out = parse_internal("<!ATTLIST foo bar CDATA \"&lt;&amp;&gt;\">");
    assert!(out.result.is_ok());
    assert!(
        out.events
            .contains(&"attributeDecl(foo, bar, CDATA, \"<&>\")".to_string()),
        "{:?}",
        out.events
    );
}

#[test]
fn fixed_id_attribute_is_reported_but_still_declared() {
    let out = parse_internal("<!ATTLIST foo id ID #FIXED \"x\">");
    assert!(out.result.is_ok());
    assert!(!out.valid);
    assert!(out.has_code(XmlParserErrors::XmlDTDIDFixed));
    assert!(
        out.events
            .contains(&"attributeDecl(foo, id, ID, #FIXED \"x\")".to_string()),
        "{:?}",
        out.events
    );
}

#[test]
fn duplicate_mixed_child_reported_once() {
    let out = parse_internal("<!ELEMENT foo (#PCDATA | a | a)*>");
    assert!(out.result.is_ok());
    assert!(!out.valid);
    assert!(out.has_code(XmlParserErrors::XmlDTDContentError));
    let mentions = out
        .events
        .iter()
        .filter(|e| *e == "mixedElement(a)")
        .count();
    assert_eq!(mentions, 1);
    assert!(out.events.contains(&"startContentModel(foo, MIXED)".to_string()));
    assert!(out.events.contains(&"endContentModel(foo, MIXED)".to_string()));
}

#[test]
fn clean_dtd_has_no_finalization_errors() {
    let out = parse_internal(concat!(
        "<!ELEMENT foo EMPTY>\n",
        "<!ATTLIST foo id ID #IMPLIED>\n",
    ));
    assert!(out.result.is_ok());
    assert!(out.valid);
    assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);
}

#[test]
fn mixed_connectors_in_one_group_are_fatal() {
    let out = parse_internal("<!ELEMENT foo (a, b | c)>");
    let err = out.result.unwrap_err();
    assert_eq!(err.code, XmlParserErrors::XmlErrSeparatorRequired);
    assert!(!out.well_formed);
}

#[test]
fn nested_group_event_stream() {
    let out = parse_internal("<!ELEMENT foo (a, (b | c))>");
    assert!(out.result.is_ok(), "{:?}", out.result);
    assert_eq!(
        out.events,
        vec![
            "startDTD",
            "startContentModel(foo, CHILDREN)",
            "startModelGroup",
            "childElement(a)",
            "connector(,)",
            "startModelGroup",
            "childElement(b)",
            "connector(|)",
            "childElement(c)",
            "endModelGroup()",
            "endModelGroup()",
            "endContentModel(foo, CHILDREN)",
            "endDTD",
        ]
    );
}

#[test]
fn occurrence_suffixes_are_forwarded() {
    let out = parse_internal("<!ELEMENT foo (a?, b*, c+)>");
    assert!(out.events.contains(&"childElement(a?)".to_string()));
    assert!(out.events.contains(&"childElement(b*)".to_string()));
    assert!(out.events.contains(&"childElement(c+)".to_string()));
}

#[test]
fn first_entity_declaration_sticks() {
    let out = parse_internal(concat!(
        "<!ENTITY e \"one\">\n",
        "<!ENTITY e \"two\">\n",
        "<!ATTLIST foo a CDATA \"&e;\">\n",
    ));
    assert!(out.result.is_ok());
    assert!(out.has_code(XmlParserErrors::XmlWarEntityRedefined));
    assert!(
        out.events
            .contains(&"attributeDecl(foo, a, CDATA, \"one\")".to_string()),
        "{:?}",
        out.events
    );
}

#[test]
fn duplicate_element_declaration_forwards_both_models() {
    let out = parse_internal("<!ELEMENT foo EMPTY><!ELEMENT foo ANY>");
    assert!(out.result.is_ok());
    assert!(!out.valid);
    assert!(out.has_code(XmlParserErrors::XmlDTDElemRedefined));
    assert!(out.events.contains(&"startContentModel(foo, EMPTY)".to_string()));
    assert!(out.events.contains(&"startContentModel(foo, ANY)".to_string()));
}

#[test]
fn dangling_idref_fails_finalization() {
    let out = parse_internal("<!ATTLIST foo r IDREF \"missing\">");
    assert!(out.result.is_ok());
    assert!(!out.valid);
    assert!(out.has_code(XmlParserErrors::XmlDTDUnknownID));
}

#[test]
fn notation_forward_reference_resolves() {
    let out = parse_internal(concat!(
        "<!ENTITY pic SYSTEM \"p.gif\" NDATA gif>\n",
        "<!NOTATION gif SYSTEM \"viewer\">\n",
    ));
    assert!(out.result.is_ok());
    assert!(out.valid, "{:?}", out.diagnostics);
    assert!(
        out.events
            .contains(&"unparsedEntityDecl(pic, -, p.gif, gif)".to_string())
    );
    assert!(out.events.contains(&"notationDecl(gif, -, viewer)".to_string()));
}

#[test]
fn undeclared_notation_fails_finalization() {
    let out = parse_internal("<!ENTITY pic SYSTEM \"p.gif\" NDATA gif>");
    assert!(out.result.is_ok());
    assert!(!out.valid);
    assert!(out.has_code(XmlParserErrors::XmlDTDUnknownNotation));
}

#[test]
fn parameter_entity_between_declarations() {
    let out = parse_internal(concat!(
        "<!ENTITY % decl \"<!ELEMENT foo EMPTY>\">\n",
        "%decl;\n",
    ));
    assert!(out.result.is_ok(), "{:?}", out.result);
    assert!(out.events.contains(&"startContentModel(foo, EMPTY)".to_string()));
}

#[test]
fn lexical_parameter_entity_inside_declaration() {
    let out = parse_external(concat!(
        "<!ENTITY % model \"foo EMPTY\">\n",
        "<!ELEMENT %model;>\n",
    ));
    assert!(out.result.is_ok(), "{:?}", out.result);
    assert!(out.events.contains(&"startContentModel(foo, EMPTY)".to_string()));
}

#[test]
fn parameter_entity_forbidden_in_internal_entity_value() {
    let out = parse_internal(concat!(
        "<!ENTITY % a \"x\">\n",
        "<!ENTITY b \"%a;\">\n",
    ));
    let err = out.result.unwrap_err();
    assert_eq!(err.code, XmlParserErrors::XmlErrEntityPEInternal);
}

#[test]
fn parameter_entity_included_in_literal_in_external_subset() {
    let out = parse_external(concat!(
        "<!ENTITY % inner \"abc\">\n",
        "<!ENTITY outer \"x%inner;y\">\n",
    ));
    assert!(out.result.is_ok(), "{:?}", out.result);
    assert!(
        out.events
            .contains(&"internalGeneralEntityDecl(outer, \"xabcy\")".to_string()),
        "{:?}",
        out.events
    );
}

#[test]
fn bare_percent_before_non_name_is_rejected_cleanly() {
    // A `%` that opens no reference is handed back to the grammar, and
    // rejecting it again must not collide with the reader's lookahead.
    let out = parse_external("% x");
    let err = out.result.unwrap_err();
    assert_eq!(err.code, XmlParserErrors::XmlErrExtSubsetNotFinished);
    assert!(!out.well_formed);
}

#[test]
fn undeclared_parameter_entity_is_a_warning() {
    let out = parse_internal("%nowhere;");
    assert!(out.result.is_ok(), "{:?}", out.result);
    assert!(out.well_formed);
    assert!(out.has_code(XmlParserErrors::XmlWarUndeclaredEntity));
    let warning = out
        .diagnostics
        .iter()
        .find(|d| d.code == XmlParserErrors::XmlWarUndeclaredEntity)
        .unwrap();
    assert_eq!(warning.level, XmlErrorLevel::XmlErrWarning);
}

#[test]
fn conditional_sections_include_and_ignore() {
    let out = parse_external(concat!(
        "<![INCLUDE[<!ELEMENT a EMPTY>]]>\n",
        "<![IGNORE[<!ELEMENT b EMPTY> <![ nested junk ]]> tail ]]>\n",
    ));
    assert!(out.result.is_ok(), "{:?}", out.result);
    assert!(out.events.contains(&"startContentModel(a, EMPTY)".to_string()));
    assert!(!out.events.iter().any(|e| e.contains("(b,")));
}

#[test]
fn conditional_section_rejected_in_internal_subset() {
    let out = parse_internal("<![INCLUDE[<!ELEMENT a EMPTY>]]>");
    let err = out.result.unwrap_err();
    assert_eq!(err.code, XmlParserErrors::XmlErrCondsecInvalid);
}

#[test]
fn comments_and_processing_instructions() {
    let out = parse_internal("<!-- hello --><?target some data?>");
    assert!(out.result.is_ok());
    assert!(out.events.contains(&"comment( hello )".to_string()));
    assert!(
        out.events
            .contains(&"processingInstruction(target, some data)".to_string())
    );
}

#[test]
fn double_hyphen_in_comment_is_fatal() {
    let out = parse_internal("<!-- a -- b -->");
    let err = out.result.unwrap_err();
    assert_eq!(err.code, XmlParserErrors::XmlErrHyphenInComment);
}

#[test]
fn xml_space_enumeration_is_checked() {
    let out = parse_internal("<!ATTLIST foo xml:space (default|wrong) \"default\">");
    assert!(out.result.is_ok());
    assert!(!out.valid);
    assert!(out.has_code(XmlParserErrors::XmlWarSpaceValue));
}

#[test]
fn xml_lang_default_is_checked() {
    let out = parse_internal("<!ATTLIST foo xml:lang CDATA \"not a language tag\">");
    assert!(out.result.is_ok());
    assert!(!out.valid);
    assert!(out.has_code(XmlParserErrors::XmlWarLangValue));
}

#[test]
fn duplicate_enumeration_token_is_a_validity_error() {
    let out = parse_internal("<!ATTLIST foo a (x|x) #IMPLIED>");
    assert!(out.result.is_ok());
    assert!(!out.valid);
    assert!(out.has_code(XmlParserErrors::XmlDTDDupToken));
    assert!(
        out.events
            .contains(&"attributeDecl(foo, a, (x), #IMPLIED)".to_string()),
        "{:?}",
        out.events
    );
}

#[test]
fn notation_attribute_type_references_notations() {
    let out = parse_internal("<!ATTLIST foo fmt NOTATION (gif|png) #IMPLIED>");
    assert!(out.result.is_ok());
    assert!(!out.valid);
    assert!(out.has_code(XmlParserErrors::XmlDTDUnknownNotation));
    assert!(
        out.events
            .contains(&"attributeDecl(foo, fmt, NOTATION (gif|png), #IMPLIED)".to_string()),
        "{:?}",
        out.events
    );
}

#[test]
fn unescaped_lt_in_attribute_value_is_fatal() {
    let out = parse_internal("<!ATTLIST foo a CDATA \"a<b\">");
    let err = out.result.unwrap_err();
    assert_eq!(err.code, XmlParserErrors::XmlErrLtInAttribute);
}

#[test]
fn attribute_value_referencing_external_entity_is_fatal() {
    let out = parse_internal(concat!(
        "<!ENTITY ext SYSTEM \"other.txt\">\n",
        "<!ATTLIST foo a CDATA \"&ext;\">\n",
    ));
    let err = out.result.unwrap_err();
    assert_eq!(err.code, XmlParserErrors::XmlErrEntityIsExternal);
}

#[test]
fn uri_fragment_in_system_id_is_an_error() {
    let out = parse_internal("<!ENTITY e SYSTEM \"chap.xml#frag\">");
    assert!(out.result.is_ok());
    assert!(out.has_code(XmlParserErrors::XmlErrURIFragment));
}

#[test]
fn colon_in_entity_name_is_reported() {
    let out = parse_internal("<!ENTITY ns:e \"v\">");
    assert!(out.result.is_ok());
    assert!(out.has_code(XmlParserErrors::XmlNsErrColon));
}

fn occur_suffix(occur: XmlElementContentOccur) -> &'static str {
    match occur {
        XmlElementContentOccur::XmlElementContentOnce => "",
        XmlElementContentOccur::XmlElementContentOpt => "?",
        XmlElementContentOccur::XmlElementContentMult => "*",
        XmlElementContentOccur::XmlElementContentPlus => "+",
    }
}

/// Rebuilds DTD text from the event stream it receives.
#[derive(Default)]
struct DtdWriter {
    text: String,
}

impl DtdHandler for DtdWriter {
    fn start_content_model(&mut self, name: &str, typ: XmlElementTypeVal) {
        match typ {
            XmlElementTypeVal::XmlElementTypeEmpty => {
                self.text.push_str(&format!("<!ELEMENT {name} EMPTY>\n"));
            }
            XmlElementTypeVal::XmlElementTypeAny => {
                self.text.push_str(&format!("<!ELEMENT {name} ANY>\n"));
            }
            XmlElementTypeVal::XmlElementTypeMixed => {
                self.text.push_str(&format!("<!ELEMENT {name} (#PCDATA"));
            }
            XmlElementTypeVal::XmlElementTypeElement => {
                self.text.push_str(&format!("<!ELEMENT {name} "));
            }
        }
    }

    fn child_element(&mut self, name: &str, occur: XmlElementContentOccur) {
        self.text.push_str(name);
        self.text.push_str(occur_suffix(occur));
    }

    fn connector(&mut self, connector: XmlElementContentConnector) {
        self.text.push(match connector {
            XmlElementContentConnector::XmlElementContentSeq => ',',
            XmlElementContentConnector::XmlElementContentOr => '|',
        });
    }

    fn start_model_group(&mut self) {
        self.text.push('(');
    }

    fn end_model_group(&mut self, occur: XmlElementContentOccur) {
        self.text.push(')');
        self.text.push_str(occur_suffix(occur));
    }

    fn mixed_element(&mut self, name: &str) {
        self.text.push_str(" | ");
        self.text.push_str(name);
    }

    fn end_content_model(&mut self, _name: &str, typ: XmlElementTypeVal) {
        match typ {
            XmlElementTypeVal::XmlElementTypeMixed => self.text.push_str(")*>\n"),
            XmlElementTypeVal::XmlElementTypeElement => self.text.push_str(">\n"),
            _ => {}
        }
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
            XmlAttributeType::XmlAttributeEnumeration => format!("({})", enumeration.join("|")),
            XmlAttributeType::XmlAttributeNotation => {
                format!("NOTATION ({})", enumeration.join("|"))
            }
        };
        let default = match (default, default_value) {
            (XmlAttributeDefault::XmlAttributeRequired, _) => "#REQUIRED".to_string(),
            (XmlAttributeDefault::XmlAttributeImplied, _) => "#IMPLIED".to_string(),
            (XmlAttributeDefault::XmlAttributeFixed, Some(value)) => format!("#FIXED \"{value}\""),
            (_, Some(value)) => format!("\"{value}\""),
            (_, None) => String::new(),
        };
        self.text
            .push_str(&format!("<!ATTLIST {elem} {name} {typ} {default}>\n"));
    }

    fn internal_general_entity_decl(&mut self, name: &str, value: &str) {
        self.text.push_str(&format!("<!ENTITY {name} \"{value}\">\n"));
    }

    fn notation_decl(&mut self, name: &str, public_id: Option<&str>, system_id: Option<&str>) {
        match (public_id, system_id) {
            (Some(public_id), Some(system_id)) => self.text.push_str(&format!(
                "<!NOTATION {name} PUBLIC \"{public_id}\" \"{system_id}\">\n"
            )),
            (Some(public_id), None) => self
                .text
                .push_str(&format!("<!NOTATION {name} PUBLIC \"{public_id}\">\n")),
            (None, Some(system_id)) => self
                .text
                .push_str(&format!("<!NOTATION {name} SYSTEM \"{system_id}\">\n")),
            (None, None) => {}
        }
    }
}

#[test]
fn reserialized_model_parses_to_the_same_events() {
    let source = concat!(
        "<!ELEMENT doc (head, body+)>\n",
        "<!ELEMENT head EMPTY>\n",
        "<!ELEMENT body (#PCDATA | em)*>\n",
        "<!ATTLIST doc id ID #IMPLIED>\n",
        "<!ATTLIST body class (big|small) \"small\">\n",
        "<!ENTITY version \"1.0\">\n",
        "<!NOTATION tiff SYSTEM \"tiff-viewer\">\n",
    );
    let first = parse_internal(source);
    assert!(first.result.is_ok(), "{:?}", first.result);
    assert!(first.diagnostics.is_empty(), "{:?}", first.diagnostics);

    let mut writer = DtdWriter::default();
    {
        let mut ctxt = DtdParserCtxt::new(&mut writer);
        ctxt.parse_internal_subset(source).unwrap();
    }
    let second = parse_internal(&writer.text);
    assert!(second.result.is_ok(), "{}", writer.text);
    assert!(second.diagnostics.is_empty(), "{:?}", second.diagnostics);
    assert_eq!(first.events, second.events, "{}", writer.text);
}

#[test]
fn fixture_files_parse_clean() {
    let mut seen = 0;
    for entry in glob::glob("test/dtds/*.dtd").unwrap() {
        let path = entry.unwrap();
        let mut collector = EventCollector::new();
        let mut ctxt = DtdParserCtxt::new(&mut collector);
        let result = ctxt.parse_uri(&path.display().to_string());
        assert!(result.is_ok(), "{}: {:?}", path.display(), result);
        assert!(ctxt.well_formed && ctxt.valid, "{}", path.display());
        seen += 1;
    }
    assert!(seen >= 2, "fixture files missing");
}
