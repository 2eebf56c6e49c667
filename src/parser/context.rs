//! The per-parse context: input entity stack, symbol tables, expansion
//! limits, diagnostic state, and the character-level reader primitives
//! the grammar engine is built on.

use std::{cell::RefCell, collections::HashSet, rc::Rc};

use crate::{
    chvalid::{xml_is_blank_char, xml_is_name_char, xml_is_name_start_char},
    dict::XmlDict,
    entity::{XmlEntity, XmlEntityTable},
    error::{
        DefaultCatalog, MessageCatalog, XmlError, XmlErrorDomain, XmlErrorLevel, XmlParserErrors,
    },
    parser::{
        error::{xml_fatal_err_msg, xml_warning_msg},
        input::{ParserInput, ParserInputKind},
        loader::{DefaultResolver, EntityResolver},
        sax::{DtdHandler, DtdLocator},
        valid::{IdTable, NotationTable},
    },
};

/// Maximum length of a Name or Nmtoken.
pub(crate) const XML_MAX_NAME_LENGTH: usize = 50_000;
/// Maximum length of a literal.
pub(crate) const XML_MAX_TEXT_LENGTH: usize = 10_000_000;
/// Maximum depth of the input entity stack.
pub(crate) const XML_MAX_ENTITY_DEPTH: usize = 40;
/// Replacement-text budget above which amplification is checked.
pub(crate) const XML_PARSER_ALLOWED_EXPANSION: u64 = 1_000_000;
/// Maximum tolerated ratio of replacement text to consumed input.
pub(crate) const XML_PARSER_NON_LINEAR: u64 = 10;
/// Fixed accounting cost of one entity push.
pub(crate) const XML_ENT_FIXED_COST: u64 = 20;

/// The DTD parser context.
///
/// All tables live here and are rebuilt for every parse; nothing is
/// ambient or static, so independent parses never interfere.
pub struct DtdParserCtxt<'a> {
    pub(crate) handler: &'a mut dyn DtdHandler,
    pub(crate) resolver: Box<dyn EntityResolver>,
    pub(crate) catalog: Box<dyn MessageCatalog>,
    pub(crate) dict: Rc<RefCell<XmlDict>>,

    /// The input entity stack. The bottom input is the document entity
    /// (or the external subset stream); everything above it is an entity
    /// expansion in progress.
    pub(crate) inputs: Vec<ParserInput>,
    input_id: u32,
    /// Overflow pushback slot. The mode-aware reader can hand back a
    /// bare `%` while the current input's pushback slot still holds the
    /// lookahead that disproved the reference; a rejected `%` then lands
    /// here instead of colliding with that slot. Read before any input.
    pending: Option<char>,

    pub(crate) entities: XmlEntityTable,
    pub(crate) ids: IdTable,
    pub(crate) notations: NotationTable,
    pub(crate) declared_elements: HashSet<Rc<str>>,
    /// Names of the entities currently open on the input stack, used to
    /// catch reference cycles.
    pub(crate) open_entities: Vec<Rc<str>>,

    /// When set, `%name;` is spliced transparently into the character
    /// stream by the reader itself. On in the external subset and inside
    /// expanded parameter entities, off in the internal subset and while
    /// scanning literals.
    pub(crate) lexical_pe: bool,
    /// Whether the base input currently holds internal subset text.
    pub(crate) in_internal_subset: bool,

    /// Cumulative size of entity replacement text copied into the parse.
    pub(crate) sizeentcopy: u64,
    /// Characters consumed from closed non-expansion inputs.
    consumed: u64,

    pub err_no: XmlParserErrors,
    pub well_formed: bool,
    pub valid: bool,
    pub nb_errors: u32,
    pub nb_warnings: u32,

    pub(crate) locator: Rc<DtdLocator>,
}

impl<'a> DtdParserCtxt<'a> {
    pub fn new(handler: &'a mut dyn DtdHandler) -> Self {
        let dict = Rc::new(RefCell::new(XmlDict::new()));
        let entities = XmlEntityTable::new(|s| dict.borrow_mut().intern(s));
        Self {
            handler,
            resolver: Box::new(DefaultResolver),
            catalog: Box::new(DefaultCatalog),
            dict,
            inputs: Vec::new(),
            input_id: 0,
            pending: None,
            entities,
            ids: IdTable::default(),
            notations: NotationTable::default(),
            declared_elements: HashSet::new(),
            open_entities: Vec::new(),
            lexical_pe: false,
            in_internal_subset: false,
            sizeentcopy: 0,
            consumed: 0,
            err_no: XmlParserErrors::XmlErrOK,
            well_formed: true,
            valid: true,
            nb_errors: 0,
            nb_warnings: 0,
            locator: Rc::new(DtdLocator::default()),
        }
    }

    /// Replace the entity-resolution collaborator.
    pub fn with_resolver(mut self, resolver: impl EntityResolver + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    /// Replace the message catalog.
    pub fn with_catalog(mut self, catalog: impl MessageCatalog + 'static) -> Self {
        self.catalog = Box::new(catalog);
        self
    }

    /// Share a name dictionary with other parses.
    pub fn with_dict(mut self, dict: Rc<RefCell<XmlDict>>) -> Self {
        self.entities = XmlEntityTable::new(|s| dict.borrow_mut().intern(s));
        self.dict = dict;
        self
    }

    pub fn locator(&self) -> Rc<DtdLocator> {
        Rc::clone(&self.locator)
    }

    pub(crate) fn intern(&self, name: &str) -> Rc<str> {
        self.dict.borrow_mut().intern(name)
    }

    // ---- input stack ----

    pub(crate) fn input(&self) -> Option<&ParserInput> {
        self.inputs.last()
    }

    /// Serial number of the input currently on top of the stack.
    pub(crate) fn current_input_id(&self) -> u32 {
        self.input().map_or(0, |input| input.id)
    }

    pub(crate) fn next_input_id(&mut self) -> u32 {
        self.input_id += 1;
        self.input_id
    }

    pub(crate) fn input_push(&mut self, input: ParserInput) {
        if let Some(name) = &input.entity_name {
            self.open_entities.push(Rc::clone(name));
        }
        self.inputs.push(input);
    }

    #[doc(alias = "popInput")]
    pub(crate) fn pop_input(&mut self) -> Option<ParserInput> {
        let input = self.inputs.pop()?;
        if !matches!(input.kind, ParserInputKind::InternalEntity) {
            self.consumed = self.consumed.saturating_add(input.consumed);
        }
        if let Some(name) = &input.entity_name {
            if let Some(pos) = self.open_entities.iter().rposition(|n| Rc::ptr_eq(n, name)) {
                self.open_entities.remove(pos);
            }
        }
        Some(input)
    }

    /// Characters read from real (non-expansion) inputs so far; the
    /// denominator of the amplification ratio.
    fn total_consumed(&self) -> u64 {
        self.consumed
            + self
                .inputs
                .iter()
                .filter(|input| !matches!(input.kind, ParserInputKind::InternalEntity))
                .map(|input| input.consumed)
                .sum::<u64>()
    }

    /// Account for `extra` characters of replacement text and fail once
    /// the output is both large and non-linear in the consumed input.
    #[doc(alias = "xmlParserEntityCheck")]
    pub(crate) fn parser_entity_check(&mut self, extra: u64) -> Result<(), XmlError> {
        self.sizeentcopy = self
            .sizeentcopy
            .saturating_add(extra)
            .saturating_add(XML_ENT_FIXED_COST);
        if self.sizeentcopy > XML_PARSER_ALLOWED_EXPANSION {
            let consumed = self.total_consumed().max(1);
            if self.sizeentcopy / XML_PARSER_NON_LINEAR > consumed {
                return Err(xml_fatal_err_msg!(
                    self,
                    XmlParserErrors::XmlErrEntityAmplification,
                    "Maximum entity amplification factor exceeded"
                ));
            }
        }
        Ok(())
    }

    /// Push the expansion of `entity` with `content` as a new input.
    pub(crate) fn push_entity_input(
        &mut self,
        entity: &XmlEntity,
        content: &str,
        kind: ParserInputKind,
    ) -> Result<(), XmlError> {
        if self
            .open_entities
            .iter()
            .any(|name| Rc::ptr_eq(name, entity.name()))
        {
            return Err(xml_fatal_err_msg!(
                self,
                XmlParserErrors::XmlErrEntityLoop,
                "Detected an entity reference loop"
            ));
        }
        if self.inputs.len() >= XML_MAX_ENTITY_DEPTH {
            return Err(xml_fatal_err_msg!(
                self,
                XmlParserErrors::XmlErrResourceLimit,
                "Maximum entity nesting depth exceeded"
            ));
        }
        self.parser_entity_check(content.chars().count() as u64)?;
        let id = self.next_input_id();
        let (public_id, system_id) = match entity {
            XmlEntity::Internal { .. } => (None, self.input().and_then(|i| i.system_id.clone())),
            XmlEntity::External {
                public_id,
                system_id,
                ..
            } => (public_id.clone(), Some(system_id.clone())),
        };
        self.input_push(ParserInput::new(
            content,
            kind,
            Some(Rc::clone(entity.name())),
            public_id,
            system_id,
            entity.is_parameter(),
            id,
        ));
        Ok(())
    }

    // ---- character-level reader ----

    /// Read one character from the stack, popping exhausted expansion
    /// inputs. `Ok(None)` means the base input itself is exhausted.
    pub(crate) fn getc_raw(&mut self) -> Result<Option<char>, XmlError> {
        if let Some(c) = self.pending.take() {
            return Ok(Some(c));
        }
        loop {
            if self.inputs.is_empty() {
                return Ok(None);
            }
            if let Some(c) = self.inputs.last_mut().and_then(|input| input.getc()) {
                return Ok(Some(c));
            }
            if self.inputs.len() == 1 {
                return Ok(None);
            }
            self.pop_input();
        }
    }

    /// Read one character, splicing parameter entities transparently
    /// when lexical PE mode is on.
    pub(crate) fn getc(&mut self) -> Result<Option<char>, XmlError> {
        loop {
            match self.getc_raw()? {
                Some('%') if self.lexical_pe => {
                    if let Some(c) = self.lexical_pe_reference()? {
                        return Ok(Some(c));
                    }
                }
                other => return Ok(other),
            }
        }
    }

    /// Push back the most recently read character. When the current
    /// input's own slot is already occupied by a reader lookahead, the
    /// character goes to the context-level overflow slot, which is
    /// drained first on the next read.
    pub(crate) fn ungetc(&mut self, c: char) {
        match self.inputs.last_mut() {
            Some(input) if !input.has_pushback() => input.ungetc(c),
            _ => {
                debug_assert!(self.pending.is_none(), "overflow pushback occupied");
                self.pending = Some(c);
            }
        }
    }

    /// Read the next character without consuming it.
    pub(crate) fn peek_char(&mut self) -> Result<Option<char>, XmlError> {
        match self.getc()? {
            Some(c) => {
                self.ungetc(c);
                Ok(Some(c))
            }
            None => Ok(None),
        }
    }

    /// Consume the next character if it satisfies `pred`.
    pub(crate) fn consume_char_if(
        &mut self,
        pred: impl Fn(char) -> bool,
    ) -> Result<Option<char>, XmlError> {
        match self.getc()? {
            Some(c) if pred(c) => Ok(Some(c)),
            Some(c) => {
                self.ungetc(c);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    /// Try to match `literal` at the current position. On success the
    /// characters are consumed; on failure nothing is.
    pub(crate) fn peek(&mut self, literal: &str) -> Result<bool, XmlError> {
        // Force exhausted expansions to pop so the match sees the input
        // that actually holds the next character.
        match self.getc_raw()? {
            Some(c) => self.ungetc(c),
            None => return Ok(literal.is_empty()),
        }
        if let Some(front) = self.pending {
            // The stream front lives outside the input, so match it
            // against the literal's first character by hand.
            let mut chars = literal.chars();
            let Some(first) = chars.next() else {
                return Ok(true);
            };
            if first != front {
                return Ok(false);
            }
            let rest = chars.as_str();
            let Some(input) = self.inputs.last_mut() else {
                return Ok(false);
            };
            if input.starts_with(rest) {
                self.pending = None;
                input.advance(rest);
                return Ok(true);
            }
            return Ok(false);
        }
        let Some(input) = self.inputs.last_mut() else {
            return Ok(false);
        };
        if input.starts_with(literal) {
            input.advance(literal);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Skip whitespace, returning how many characters were skipped.
    /// In lexical PE mode this is also where parameter entities splice
    /// in, since their replacement is padded with blanks.
    #[doc(alias = "skipBlankChars")]
    pub(crate) fn skip_blanks(&mut self) -> Result<usize, XmlError> {
        let mut res = 0;
        while self
            .consume_char_if(|c| xml_is_blank_char(c as u32))?
            .is_some()
        {
            res += 1;
        }
        Ok(res)
    }

    /// Require at least one whitespace character.
    pub(crate) fn require_whitespace(&mut self, ctx: &str) -> Result<(), XmlError> {
        if self.skip_blanks()? == 0 {
            return Err(xml_fatal_err_msg!(
                self,
                XmlParserErrors::XmlErrSpaceRequired,
                "Space required {}",
                ctx
            ));
        }
        Ok(())
    }

    /// Handle a `%` seen by the mode-aware reader. Returns `Some('%')`
    /// when the percent sign does not open a reference (entity
    /// declarations use a bare `%` before the name); `None` after a
    /// reference has been expanded (or skipped) and reading should
    /// continue from the new top of stack.
    fn lexical_pe_reference(&mut self) -> Result<Option<char>, XmlError> {
        let c = match self.getc_raw()? {
            Some(c) => c,
            None => return Ok(Some('%')),
        };
        if !xml_is_name_start_char(c) {
            self.ungetc(c);
            return Ok(Some('%'));
        }
        let mut name = String::new();
        name.push(c);
        while let Some(c) = {
            match self.getc_raw()? {
                Some(c) if xml_is_name_char(c) => Some(c),
                Some(c) => {
                    self.ungetc(c);
                    None
                }
                None => None,
            }
        } {
            name.push(c);
            if name.len() > XML_MAX_NAME_LENGTH {
                return Err(xml_fatal_err_msg!(
                    self,
                    XmlParserErrors::XmlErrNameTooLong,
                    "PEReference"
                ));
            }
        }
        match self.getc_raw()? {
            Some(';') => {}
            _ => {
                return Err(xml_fatal_err_msg!(
                    self,
                    XmlParserErrors::XmlErrPERefSemicolMissing,
                    "PEReference: expecting ';' after '%{}'",
                    name
                ));
            }
        }
        self.parameter_entity_include(&name)?;
        Ok(None)
    }

    /// Push the expansion of parameter entity `name`, padded with one
    /// blank on each side as the inclusion rules require. Undeclared
    /// parameter entities draw a warning and are skipped.
    pub(crate) fn parameter_entity_include(&mut self, name: &str) -> Result<(), XmlError> {
        let Some(entity) = self.entities.get_parameter(name) else {
            xml_warning_msg!(
                self,
                XmlParserErrors::XmlWarUndeclaredEntity,
                "PEReference: %{}; not found",
                name
            );
            return Ok(());
        };
        match &*entity {
            XmlEntity::Internal { content, .. } => {
                let padded = format!(" {content} ");
                self.push_entity_input(&entity, &padded, ParserInputKind::InternalEntity)
            }
            XmlEntity::External { .. } => {
                let content = self.load_external_entity_content(&entity)?;
                let padded = format!(" {content} ");
                self.push_entity_input(&entity, &padded, ParserInputKind::ExternalEntity)
            }
        }
    }

    /// Push the expansion of parameter entity `name` without the blank
    /// padding: inside an entity value the replacement text is included
    /// in the literal as-is.
    pub(crate) fn parameter_entity_include_in_literal(
        &mut self,
        name: &str,
    ) -> Result<(), XmlError> {
        let Some(entity) = self.entities.get_parameter(name) else {
            xml_warning_msg!(
                self,
                XmlParserErrors::XmlWarUndeclaredEntity,
                "PEReference: %{}; not found",
                name
            );
            return Ok(());
        };
        match &*entity {
            XmlEntity::Internal { content, .. } => {
                let content = content.clone();
                self.push_entity_input(&entity, &content, ParserInputKind::InternalEntity)
            }
            XmlEntity::External { .. } => {
                let content = self.load_external_entity_content(&entity)?;
                self.push_entity_input(&entity, &content, ParserInputKind::ExternalEntity)
            }
        }
    }

    // ---- diagnostics ----

    pub(crate) fn sync_locator(&self) {
        if let Some(input) = self.input() {
            self.locator.update(
                input.line,
                input.col,
                input.public_id.as_deref(),
                input.system_id.as_deref(),
            );
        }
    }

    fn build_error(
        &self,
        domain: XmlErrorDomain,
        code: XmlParserErrors,
        level: XmlErrorLevel,
        args: &[&str],
        fallback: String,
    ) -> XmlError {
        let message = self
            .catalog
            .format(code, args)
            .unwrap_or(fallback);
        let (line, col, public_id, system_id) = match self.input() {
            Some(input) => (
                input.line,
                input.col,
                input.public_id.clone(),
                input.system_id.clone(),
            ),
            None => (0, 0, None, None),
        };
        XmlError {
            domain,
            code,
            level,
            message,
            public_id,
            system_id,
            line,
            col,
        }
    }

    /// Report a well-formedness violation. The returned error is meant
    /// to be propagated with `?` so the whole parse unwinds.
    pub(crate) fn raise_fatal(
        &mut self,
        code: XmlParserErrors,
        args: &[&str],
        fallback: String,
    ) -> XmlError {
        self.err_no = code;
        self.well_formed = false;
        self.nb_errors += 1;
        let error = self.build_error(
            XmlErrorDomain::XmlFromParser,
            code,
            XmlErrorLevel::XmlErrFatal,
            args,
            fallback,
        );
        self.sync_locator();
        self.handler.fatal_error(&error);
        error
    }

    /// Report a non-fatal parser error and continue.
    pub(crate) fn raise_error(&mut self, code: XmlParserErrors, args: &[&str], fallback: String) {
        self.err_no = code;
        self.nb_errors += 1;
        let error = self.build_error(
            XmlErrorDomain::XmlFromParser,
            code,
            XmlErrorLevel::XmlErrError,
            args,
            fallback,
        );
        self.sync_locator();
        self.handler.error(&error);
    }

    /// Report a validity constraint violation and continue; the document
    /// is flagged invalid.
    pub(crate) fn raise_validity_error(
        &mut self,
        code: XmlParserErrors,
        args: &[&str],
        fallback: String,
    ) {
        self.err_no = code;
        self.valid = false;
        self.nb_errors += 1;
        let error = self.build_error(
            XmlErrorDomain::XmlFromDTD,
            code,
            XmlErrorLevel::XmlErrError,
            args,
            fallback,
        );
        self.sync_locator();
        self.handler.error(&error);
    }

    /// Report a warning and continue.
    pub(crate) fn raise_warning(&mut self, code: XmlParserErrors, args: &[&str], fallback: String) {
        self.nb_warnings += 1;
        let error = self.build_error(
            XmlErrorDomain::XmlFromParser,
            code,
            XmlErrorLevel::XmlErrWarning,
            args,
            fallback,
        );
        self.sync_locator();
        self.handler.warning(&error);
    }

    /// Finally-style cleanup run on every exit path of a parse: unwind
    /// and close the whole input stack, drop every per-parse table.
    pub(crate) fn reset(&mut self) {
        while self.pop_input().is_some() {}
        self.pending = None;
        self.entities.clear();
        self.ids.clear();
        self.notations.clear();
        self.declared_elements.clear();
        self.open_entities.clear();
        self.lexical_pe = false;
        self.in_internal_subset = false;
    }
}
