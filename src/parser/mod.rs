//! The DTD parser: context, input stack, grammar engine, listener
//! contract and deferred validity checks.

pub mod context;
pub(crate) mod error;
pub mod input;
pub mod loader;
mod parse;
pub mod sax;
pub mod valid;

pub use context::DtdParserCtxt;
pub use loader::{DefaultResolver, EntityResolver, InputSource};
pub use sax::{
    DtdHandler, DtdLocator, EventCollector, XmlAttributeDefault, XmlAttributeType,
    XmlElementContentConnector, XmlElementContentOccur, XmlElementTypeVal,
};
pub use valid::{IdTable, NotationState, NotationTable};
