//! Entity recursion and expansion-bomb defenses: reference loops, the
//! nesting depth cap and the amplification ratio.

use edtd::{
    error::{XmlError, XmlParserErrors},
    parser::{DtdParserCtxt, EntityResolver, EventCollector, InputSource},
};

fn parse_internal(text: &str) -> (Result<(), XmlError>, EventCollector) {
    let mut collector = EventCollector::new();
    let result = {
        let mut ctxt = DtdParserCtxt::new(&mut collector);
        ctxt.parse_internal_subset(text)
    };
    (result, collector)
}

struct MapResolver(Vec<(&'static str, &'static str)>);

impl EntityResolver for MapResolver {
    fn resolve(&mut self, _public_id: Option<&str>, system_id: &str) -> Option<InputSource> {
        self.0
            .iter()
            .find(|(id, _)| *id == system_id)
            .map(|(id, content)| InputSource::from_content(*id, *content))
    }
}

fn parse_external_with(
    resolver: MapResolver,
    text: &str,
) -> (Result<(), XmlError>, EventCollector) {
    let mut collector = EventCollector::new();
    let result = {
        let mut ctxt = DtdParserCtxt::new(&mut collector).with_resolver(resolver);
        ctxt.parse_memory(text, Some("test.dtd"))
    };
    (result, collector)
}

#[test]
fn direct_general_entity_loop() {
    let (result, _) = parse_internal(concat!(
        "<!ENTITY e \"&e;\">\n",
        "<!ATTLIST f a CDATA \"&e;\">\n",
    ));
    assert_eq!(result.unwrap_err().code, XmlParserErrors::XmlErrEntityLoop);
}

#[test]
fn indirect_general_entity_loop() {
    let (result, _) = parse_internal(concat!(
        "<!ENTITY a \"&b;\">\n",
        "<!ENTITY b \"&a;\">\n",
        "<!ATTLIST f v CDATA \"&a;\">\n",
    ));
    assert_eq!(result.unwrap_err().code, XmlParserErrors::XmlErrEntityLoop);
}

#[test]
fn external_parameter_entity_expands() {
    let resolver = MapResolver(vec![("defs.ent", "<!ELEMENT foo EMPTY>")]);
    let (result, collector) = parse_external_with(
        resolver,
        "<!ENTITY % defs SYSTEM \"defs.ent\">\n%defs;\n",
    );
    assert!(result.is_ok(), "{result:?}");
    assert!(
        collector
            .events
            .contains(&"startContentModel(foo, EMPTY)".to_string()),
        "{:?}",
        collector.events
    );
}

#[test]
fn external_parameter_entity_loop() {
    let resolver = MapResolver(vec![("a.ent", "%a;")]);
    let (result, _) = parse_external_with(
        resolver,
        "<!ENTITY % a SYSTEM \"a.ent\">\n%a;\n",
    );
    assert_eq!(result.unwrap_err().code, XmlParserErrors::XmlErrEntityLoop);
}

#[test]
fn deep_but_finite_nesting_is_accepted() {
    let mut text = String::from("<!ENTITY e1 \"x\">\n");
    for i in 2..=30 {
        text.push_str(&format!("<!ENTITY e{i} \"&e{};\">\n", i - 1));
    }
    text.push_str("<!ATTLIST f v CDATA \"&e30;\">\n");
    let (result, collector) = parse_internal(&text);
    assert!(result.is_ok(), "{result:?}");
    assert!(
        collector
            .events
            .contains(&"attributeDecl(f, v, CDATA, \"x\")".to_string()),
        "{:?}",
        collector.events
    );
}

#[test]
fn nesting_depth_is_capped() {
    let mut text = String::from("<!ENTITY e1 \"x\">\n");
    for i in 2..=45 {
        text.push_str(&format!("<!ENTITY e{i} \"&e{};\">\n", i - 1));
    }
    text.push_str("<!ATTLIST f v CDATA \"&e45;\">\n");
    let (result, _) = parse_internal(&text);
    assert_eq!(
        result.unwrap_err().code,
        XmlParserErrors::XmlErrResourceLimit
    );
}

#[test]
fn billion_laughs_is_stopped() {
    let mut text = String::from("<!ENTITY lol0 \"lollollol\">\n");
    for i in 1..=9 {
        let refs = format!("&lol{};", i - 1).repeat(10);
        text.push_str(&format!("<!ENTITY lol{i} \"{refs}\">\n"));
    }
    text.push_str("<!ATTLIST f v CDATA \"&lol9;\">\n");
    let (result, _) = parse_internal(&text);
    assert_eq!(
        result.unwrap_err().code,
        XmlParserErrors::XmlErrEntityAmplification
    );
}
