//! Document canonicalization.
//!
//! A canonicalizer turns a JSON object into bytes such that logically equal
//! documents give equal bytes and any meaningful change gives different
//! bytes. Two ship here:
//!
//! - [`JsonCanonicalizer`]: RFC 8785 (JCS) for plain JSON.
//! - [`JsonLdCanonicalizer`]: a sorted N-Quads rendering of the statements a
//!   JSON-LD document makes, computed with a local subset of JSON-LD
//!   expansion. Remote contexts are never fetched; a context given as a URL
//!   is used as the vocabulary base.

use std::collections::{BTreeSet, HashMap};

use serde_json::{Map, Value};
use tracing::trace;

use crate::error::{ProofError, Result};

const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
const XSD_BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";
const XSD_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
const XSD_DOUBLE: &str = "http://www.w3.org/2001/XMLSchema#double";

/// Label of the top-level node when it has no `@id`.
const ROOT_LABEL: &str = "_:c14n0";

/// Turns a document (without its proof) into deterministic bytes.
pub trait Canonicalizer: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    fn canonicalize(&self, document: &Map<String, Value>) -> Result<Vec<u8>>;
}

/// JSON Canonicalization Scheme (RFC 8785).
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonCanonicalizer;

impl Canonicalizer for JsonCanonicalizer {
    fn name(&self) -> &'static str {
        "jcs"
    }

    fn canonicalize(&self, document: &Map<String, Value>) -> Result<Vec<u8>> {
        serde_jcs::to_vec(document).map_err(|e| ProofError::Canonicalization(e.to_string()))
    }
}

/// RDF statement canonicalization for JSON-LD documents.
///
/// Requires `@context`. Terms the context does not define are dropped, as
/// JSON-LD expansion drops them. Nested nodes without `@id` are labelled by
/// the hash of their own statements so labels never depend on key order.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonLdCanonicalizer;

impl Canonicalizer for JsonLdCanonicalizer {
    fn name(&self) -> &'static str {
        "rdf-nquads"
    }

    fn canonicalize(&self, document: &Map<String, Value>) -> Result<Vec<u8>> {
        if !document.contains_key("@context") {
            return Err(ProofError::Canonicalization(
                "JSON-LD document has no @context".into(),
            ));
        }

        let mut dataset = Dataset::default();
        dataset.node(document, &Context::default(), true)?;
        trace!(statements = dataset.lines.len(), "canonicalized JSON-LD");
        Ok(dataset.lines.into_iter().collect::<String>().into_bytes())
    }
}

/// Pick JSON-LD when the document has a `@context`, JCS otherwise.
pub fn infer_canonicalizer(document: &Map<String, Value>) -> &'static dyn Canonicalizer {
    if document.contains_key("@context") {
        &JsonLdCanonicalizer
    } else {
        &JsonCanonicalizer
    }
}

fn unsupported(what: &str) -> ProofError {
    ProofError::Canonicalization(format!("unsupported JSON-LD feature: {what}"))
}

fn malformed(what: &str) -> ProofError {
    ProofError::Canonicalization(format!("malformed JSON-LD: {what}"))
}

#[derive(Debug, Clone)]
enum Coercion {
    Id,
    Datatype(String),
}

#[derive(Debug, Clone)]
struct TermDefinition {
    iri: String,
    coercion: Option<Coercion>,
}

#[derive(Debug, Clone, Default)]
struct Context {
    vocab: Option<String>,
    language: Option<String>,
    terms: HashMap<String, TermDefinition>,
}

enum Key<'c> {
    Id,
    Type,
    Keyword(String),
    Property(String, Option<&'c Coercion>),
    Undefined,
}

impl Context {
    /// Apply a local `@context` on top of this one.
    fn merge(&self, local: &Value) -> Result<Context> {
        match local {
            Value::Null => Ok(Context::default()),
            Value::String(url) => {
                let mut ctx = self.clone();
                ctx.vocab = Some(vocabulary_base(url));
                Ok(ctx)
            }
            Value::Array(items) => items
                .iter()
                .try_fold(self.clone(), |ctx, item| ctx.merge(item)),
            Value::Object(map) => self.merge_object(map),
            _ => Err(malformed("@context must be a string, object or array")),
        }
    }

    fn merge_object(&self, map: &Map<String, Value>) -> Result<Context> {
        let mut ctx = self.clone();

        match map.get("@vocab") {
            Some(Value::String(vocab)) => ctx.vocab = Some(ctx.expand_iri(vocab).unwrap_or_default()),
            Some(Value::Null) => ctx.vocab = None,
            Some(_) => return Err(malformed("@vocab must be a string")),
            None => {}
        }
        match map.get("@language") {
            Some(Value::String(lang)) => ctx.language = Some(language_tag(lang)?),
            Some(Value::Null) => ctx.language = None,
            Some(_) => return Err(malformed("@language must be a string")),
            None => {}
        }

        // First pass records raw definitions so that prefixes declared in
        // the same context can be used by the second pass.
        let mut raw = ctx.clone();
        let mut pending = Vec::new();
        for (term, definition) in map {
            if term.starts_with('@') {
                continue;
            }
            match term_definition(term, definition)? {
                Some(def) => {
                    raw.terms.insert(term.clone(), def.clone());
                    pending.push((term.clone(), Some(def)));
                }
                None => {
                    raw.terms.remove(term);
                    pending.push((term.clone(), None));
                }
            }
        }

        for (term, def) in pending {
            match def {
                Some(mut def) => {
                    if !def.iri.starts_with('@') {
                        def.iri = raw.expand_iri(&def.iri).ok_or_else(|| {
                            malformed(&format!("term {term:?} does not expand to an IRI"))
                        })?;
                    }
                    if let Some(Coercion::Datatype(datatype)) = &mut def.coercion {
                        if let Some(expanded) = raw.expand_iri(datatype) {
                            *datatype = expanded;
                        }
                    }
                    ctx.terms.insert(term, def);
                }
                None => {
                    ctx.terms.remove(&term);
                }
            }
        }

        Ok(ctx)
    }

    fn expand_key<'c>(&'c self, key: &str) -> Key<'c> {
        if let Some(def) = self.terms.get(key) {
            return match def.iri.as_str() {
                "@id" => Key::Id,
                "@type" => Key::Type,
                keyword if keyword.starts_with('@') => Key::Keyword(keyword.to_owned()),
                iri => Key::Property(iri.to_owned(), def.coercion.as_ref()),
            };
        }
        match key {
            "@id" | "id" => Key::Id,
            "@type" | "type" => Key::Type,
            keyword if keyword.starts_with('@') => Key::Keyword(keyword.to_owned()),
            term => match self.expand_iri(term) {
                Some(iri) => Key::Property(iri, None),
                None => Key::Undefined,
            },
        }
    }

    /// Expand a term or compact IRI relative to the vocabulary.
    fn expand_iri(&self, value: &str) -> Option<String> {
        if value.starts_with('@') {
            return Some(value.to_owned());
        }
        if let Some(def) = self.terms.get(value) {
            return Some(def.iri.clone());
        }
        if let Some((prefix, suffix)) = value.split_once(':') {
            if prefix == "_" || suffix.starts_with("//") {
                return Some(value.to_owned());
            }
            if let Some(def) = self.terms.get(prefix) {
                return Some(format!("{}{}", def.iri, suffix));
            }
            return Some(value.to_owned());
        }
        self.vocab.as_ref().map(|vocab| format!("{vocab}{value}"))
    }

    /// Expand a node identifier. Only compact IRIs are rewritten.
    fn expand_id(&self, value: &str) -> String {
        if let Some((prefix, suffix)) = value.split_once(':') {
            if prefix != "_" && !suffix.starts_with("//") {
                if let Some(def) = self.terms.get(prefix) {
                    return format!("{}{}", def.iri, suffix);
                }
            }
        }
        value.to_owned()
    }
}

fn vocabulary_base(url: &str) -> String {
    if url.ends_with('/') || url.ends_with('#') {
        url.to_owned()
    } else {
        format!("{url}/")
    }
}

fn term_definition(term: &str, definition: &Value) -> Result<Option<TermDefinition>> {
    match definition {
        Value::Null => Ok(None),
        Value::String(iri) => Ok(Some(TermDefinition {
            iri: iri.clone(),
            coercion: None,
        })),
        Value::Object(map) => {
            if map.contains_key("@reverse") {
                return Err(unsupported("@reverse"));
            }
            if map.get("@container").and_then(Value::as_str) == Some("@list") {
                return Err(unsupported("@list containers"));
            }
            let iri = match map.get("@id") {
                Some(Value::String(iri)) => iri.clone(),
                Some(Value::Null) => return Ok(None),
                Some(_) => return Err(malformed(&format!("@id of term {term:?}"))),
                None => term.to_owned(),
            };
            let coercion = match map.get("@type") {
                Some(Value::String(t)) if t == "@id" || t == "@vocab" => Some(Coercion::Id),
                Some(Value::String(t)) => Some(Coercion::Datatype(t.clone())),
                Some(_) => return Err(malformed(&format!("@type of term {term:?}"))),
                None => None,
            };
            Ok(Some(TermDefinition { iri, coercion }))
        }
        _ => Err(malformed(&format!("definition of term {term:?}"))),
    }
}

#[derive(Default)]
struct Dataset {
    lines: BTreeSet<String>,
}

impl Dataset {
    /// Emit the statements of one node and return its subject term.
    fn node(&mut self, node: &Map<String, Value>, parent: &Context, root: bool) -> Result<String> {
        let ctx = match node.get("@context") {
            Some(local) => parent.merge(local)?,
            None => parent.clone(),
        };

        let mut subject = None;
        let mut statements: Vec<(String, String)> = Vec::new();

        for (key, value) in node {
            if key == "@context" {
                continue;
            }
            match ctx.expand_key(key) {
                Key::Id => {
                    let id = value.as_str().ok_or_else(|| malformed("@id must be a string"))?;
                    subject = Some(term(&ctx.expand_id(id))?);
                }
                Key::Type => {
                    for t in flatten(value) {
                        let t = t.as_str().ok_or_else(|| malformed("@type must be a string"))?;
                        if let Some(iri) = ctx.expand_iri(t) {
                            statements.push((term(RDF_TYPE)?, term(&iri)?));
                        }
                    }
                }
                Key::Keyword(keyword) => match keyword.as_str() {
                    "@graph" | "@list" | "@reverse" | "@included" | "@nest" | "@value" => {
                        return Err(unsupported(&keyword));
                    }
                    _ => {}
                },
                Key::Property(predicate, coercion) => {
                    for item in flatten(value) {
                        if let Some(object) = self.object(item, &ctx, coercion)? {
                            statements.push((term(&predicate)?, object));
                        }
                    }
                }
                Key::Undefined => trace!(term = %key, "dropping undefined term"),
            }
        }

        let subject = match subject {
            Some(subject) => subject,
            None if root => ROOT_LABEL.to_owned(),
            None => blank_label(&statements),
        };
        for (predicate, object) in statements {
            self.lines.insert(format!("{subject} {predicate} {object} .\n"));
        }
        Ok(subject)
    }

    fn object(
        &mut self,
        item: &Value,
        ctx: &Context,
        coercion: Option<&Coercion>,
    ) -> Result<Option<String>> {
        let object = match item {
            Value::Null => return Ok(None),
            Value::Bool(b) => typed(&b.to_string(), XSD_BOOLEAN)?,
            Value::Number(n) => number(n)?,
            Value::String(s) => match coercion {
                Some(Coercion::Id) => term(&ctx.expand_id(s))?,
                Some(Coercion::Datatype(datatype)) => typed(s, datatype)?,
                None => match &ctx.language {
                    Some(lang) => format!("{}@{}", quote(s), lang),
                    None => quote(s),
                },
            },
            Value::Object(map) if map.contains_key("@value") => return value_object(map, ctx),
            Value::Object(map) if map.contains_key("@list") => return Err(unsupported("@list")),
            Value::Object(map) => self.node(map, ctx, false)?,
            Value::Array(_) => return Err(malformed("nested array survived flattening")),
        };
        Ok(Some(object))
    }
}

fn value_object(map: &Map<String, Value>, ctx: &Context) -> Result<Option<String>> {
    let lexical = match &map["@value"] {
        Value::Null => return Ok(None),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        _ => return Err(malformed("@value must be a scalar")),
    };

    if let Some(datatype) = map.get("@type") {
        let datatype = datatype
            .as_str()
            .and_then(|t| ctx.expand_iri(t))
            .ok_or_else(|| malformed("@type of value object"))?;
        return typed(&lexical, &datatype).map(Some);
    }
    if let Some(lang) = map.get("@language") {
        let lang = lang
            .as_str()
            .ok_or_else(|| malformed("@language must be a string"))?;
        return Ok(Some(format!("{}@{}", quote(&lexical), language_tag(lang)?)));
    }

    Ok(Some(match &map["@value"] {
        Value::Bool(_) => typed(&lexical, XSD_BOOLEAN)?,
        Value::Number(n) => number(n)?,
        _ => quote(&lexical),
    }))
}

/// Arrays and `@set` objects are both just multiple values.
fn flatten(value: &Value) -> Vec<&Value> {
    fn walk<'a>(value: &'a Value, out: &mut Vec<&'a Value>) {
        match value {
            Value::Array(items) => items.iter().for_each(|item| walk(item, out)),
            Value::Object(map) if map.len() == 1 && map.contains_key("@set") => {
                walk(&map["@set"], out)
            }
            other => out.push(other),
        }
    }
    let mut out = Vec::new();
    walk(value, &mut out);
    out
}

fn blank_label(statements: &[(String, String)]) -> String {
    let mut parts: Vec<String> = statements
        .iter()
        .map(|(predicate, object)| format!("{predicate} {object}\n"))
        .collect();
    parts.sort();
    let hash = blake3::hash(parts.concat().as_bytes());
    format!("_:h{}", &hex::encode(hash.as_bytes())[..16])
}

/// Render an IRI or blank node label as an N-Quads term.
///
/// Characters that would end the term early are rejected rather than
/// escaped, so one document can never render as another's statements.
fn term(iri: &str) -> Result<String> {
    if let Some(label) = iri.strip_prefix("_:") {
        let valid = !label.is_empty()
            && label
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
        if !valid {
            return Err(malformed(&format!("blank node label {iri:?}")));
        }
        return Ok(iri.to_owned());
    }
    if let Some(c) = iri.chars().find(|&c| forbidden_in_iri(c)) {
        return Err(malformed(&format!("IRI {iri:?} contains {c:?}")));
    }
    Ok(format!("<{iri}>"))
}

fn forbidden_in_iri(c: char) -> bool {
    c <= ' '
        || c.is_control()
        || matches!(c, '<' | '>' | '"' | '{' | '}' | '|' | '^' | '`' | '\\')
}

/// BCP 47 shape: `[a-zA-Z]+(-[a-zA-Z0-9]+)*`, lowercased.
fn language_tag(tag: &str) -> Result<String> {
    let mut subtags = tag.split('-');
    let primary_ok = subtags
        .next()
        .is_some_and(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_alphabetic()));
    let rest_ok = subtags.all(|s| !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric()));
    if !(primary_ok && rest_ok) {
        return Err(malformed(&format!("language tag {tag:?}")));
    }
    Ok(tag.to_ascii_lowercase())
}

fn typed(lexical: &str, datatype: &str) -> Result<String> {
    Ok(format!("{}^^{}", quote(lexical), term(datatype)?))
}

fn number(n: &serde_json::Number) -> Result<String> {
    if n.is_i64() || n.is_u64() {
        typed(&n.to_string(), XSD_INTEGER)
    } else {
        let f = n.as_f64().unwrap_or_default();
        typed(&format!("{f:E}"), XSD_DOUBLE)
    }
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}
