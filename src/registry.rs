//! Named struct declarations.

use std::{
    collections::{HashMap, HashSet},
    rc::Rc,
};

use log::debug;

use crate::{
    Error,
    descriptor::{DataItem, Field, ItemType},
};

/// A mapping from struct names to their field lists.
///
/// A declaration may only embed structs that are already registered, and
/// never itself, so the composition graph is acyclic at all times.
#[derive(Debug, Default)]
pub struct Registry {
    structs: HashMap<String, Rc<[Field]>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discard every declaration.
    pub fn clear(&mut self) {
        self.structs.clear();
    }

    pub fn contains(&self, name: &str) -> bool {
        self.structs.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.structs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.structs.is_empty()
    }

    /// Register a struct, replacing any earlier declaration of the same name.
    ///
    /// Fails without modifying the registry if a field embeds the struct
    /// itself, embeds an undeclared struct, or embeds a struct that leads
    /// back to `name`.
    pub fn declare(&mut self, name: &str, fields: Vec<Field>) -> Result<(), Error> {
        self.check_width(name, &fields)?;
        self.check_depth(name, &fields)?;

        debug!("declared struct `{name}` with {} fields", fields.len());
        self.structs.insert(name.to_string(), fields.into());

        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Result<Rc<[Field]>, Error> {
        self.structs
            .get(name)
            .cloned()
            .ok_or_else(|| Error::StructNotFound(name.to_string()))
    }

    fn check_width(&self, name: &str, fields: &[Field]) -> Result<(), Error> {
        for embedded in fields.iter().filter_map(|f| f.item.ty.struct_name()) {
            if embedded == name {
                Err(Error::SelfReference(name.to_string()))?;
            }
            if !self.contains(embedded) {
                Err(Error::MissingDefinition {
                    name: name.to_string(),
                    missing: embedded.to_string(),
                })?;
            }
        }

        Ok(())
    }

    fn check_depth(&self, name: &str, fields: &[Field]) -> Result<(), Error> {
        let mut visited = HashSet::new();
        let mut pending: Vec<(&str, &str)> = fields
            .iter()
            .filter_map(|f| f.item.ty.struct_name())
            .map(|embedded| (name, embedded))
            .collect();

        while let Some((parent, current)) = pending.pop() {
            if current == name {
                Err(Error::CircularDefinition {
                    name: name.to_string(),
                    via: parent.to_string(),
                })?;
            }

            if !visited.insert(current) {
                continue;
            }

            let Some(children) = self.structs.get(current) else {
                Err(Error::MissingDefinition {
                    name: parent.to_string(),
                    missing: current.to_string(),
                })?
            };

            pending.extend(
                children
                    .iter()
                    .filter_map(|f| f.item.ty.struct_name())
                    .map(|embedded| (current, embedded)),
            );
        }

        Ok(())
    }

    /// Render a declaration as numbered lines in descriptor form.
    pub fn describe(&self, name: &str) -> Result<String, Error> {
        let fields = self.lookup(name)?;

        Ok(fields
            .iter()
            .enumerate()
            .map(|(i, field)| format!("{}) {field}\n", i + 1))
            .collect())
    }

    /// Number of bytes one instance of a struct consumes, if fixed.
    ///
    /// Returns `None` when any field, directly or through an embedded
    /// struct, is a null-terminated string. Callback fields consume nothing.
    pub fn size_of(&self, name: &str) -> Result<Option<usize>, Error> {
        let fields = self.lookup(name)?;

        let mut total = 0usize;
        for field in fields.iter() {
            match self.item_size(&field.item)? {
                Some(size) => total = total.saturating_add(size),
                None => return Ok(None),
            }
        }

        Ok(Some(total))
    }

    fn item_size(&self, item: &DataItem) -> Result<Option<usize>, Error> {
        let unit = match &item.ty {
            ItemType::Int(t) => Some(t.width()),
            ItemType::Float(t) => Some(t.width()),
            ItemType::Str | ItemType::WStr if item.size == 0 => None,
            ItemType::Str | ItemType::Void => Some(item.size),
            ItemType::WStr => Some(item.size.saturating_mul(2)),
            ItemType::Function(_) => Some(0),
            ItemType::Custom(name) => self.size_of(name)?,
        };

        Ok(unit.map(|u| u.saturating_mul(item.count)))
    }
}

#[cfg(test)]
mod tests {
    use super::Registry;
    use crate::{Error, descriptor::parse_fields};

    fn declare(registry: &mut Registry, name: &str, fields: &str) -> Result<(), Error> {
        registry.declare(name, parse_fields(fields).unwrap())
    }

    #[test]
    fn nested() {
        let mut registry = Registry::new();

        declare(&mut registry, "one", "u8:aaa").unwrap();
        declare(&mut registry, "two", "u8:bbb").unwrap();
        declare(&mut registry, "three", "one:xxx two:yyy").unwrap();

        assert_eq!(registry.len(), 3);
        assert_eq!(registry.lookup("three").unwrap().len(), 2);
    }

    #[test]
    fn self_reference() {
        let mut registry = Registry::new();
        let err = declare(&mut registry, "one", "one:xxx").unwrap_err();
        assert!(matches!(err, Error::SelfReference(n) if n == "one"));
        assert!(registry.is_empty());
    }

    #[test]
    fn forward_reference() {
        let mut registry = Registry::new();
        let err = declare(&mut registry, "one", "two:xxx").unwrap_err();
        assert!(matches!(err, Error::MissingDefinition { missing, .. } if missing == "two"));
    }

    #[test]
    fn callbacks_are_not_struct_references() {
        let mut registry = Registry::new();
        declare(&mut registry, "one", "@one:xxx @missing:yyy").unwrap();
    }

    #[test]
    fn redeclaration_cannot_close_a_cycle() {
        let mut registry = Registry::new();

        declare(&mut registry, "a", "u8:x").unwrap();
        declare(&mut registry, "b", "a:inner").unwrap();
        declare(&mut registry, "c", "b:inner").unwrap();

        let err = declare(&mut registry, "a", "c:outer").unwrap_err();
        assert!(matches!(err, Error::CircularDefinition { name, via } if name == "a" && via == "b"));

        // The earlier declaration survives the failure.
        assert_eq!(registry.describe("a").unwrap(), "1) u8:x\n");
    }

    #[test]
    fn redeclaration_replaces() {
        let mut registry = Registry::new();

        declare(&mut registry, "a", "u8:x").unwrap();
        declare(&mut registry, "a", "u16:y u32:z").unwrap();

        assert_eq!(registry.lookup("a").unwrap().len(), 2);
    }

    #[test]
    fn describe() {
        let mut registry = Registry::new();
        declare(&mut registry, "one", "u8:aaa void#2*3 str#16*4:tag @cb:sum").unwrap();

        assert_eq!(
            registry.describe("one").unwrap(),
            "1) u8:aaa\n2) void#2*3\n3) str#16*4:tag\n4) @cb:sum\n"
        );
        assert!(matches!(registry.describe("two"), Err(Error::StructNotFound(_))));
    }

    #[test]
    fn size_of() {
        let mut registry = Registry::new();

        declare(&mut registry, "one", "u8:aaa u16:bbb").unwrap();
        declare(&mut registry, "two", "u32:ccc i16:ddd void#4*2 wstr#3:e @cb:f").unwrap();
        declare(&mut registry, "three", "one*2:xxx two:yyy f64:z").unwrap();
        declare(&mut registry, "four", "one:xxx str:name").unwrap();

        assert_eq!(registry.size_of("one").unwrap(), Some(3));
        assert_eq!(registry.size_of("two").unwrap(), Some(4 + 2 + 8 + 6));
        assert_eq!(registry.size_of("three").unwrap(), Some(6 + 20 + 8));
        assert_eq!(registry.size_of("four").unwrap(), None);
    }

    #[test]
    fn clear() {
        let mut registry = Registry::new();
        declare(&mut registry, "one", "u8:aaa").unwrap();

        registry.clear();

        assert!(matches!(registry.lookup("one"), Err(Error::StructNotFound(_))));
    }
}
