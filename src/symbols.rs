//! Read-only symbol database: classes, inheritance links and methods.
//!
//! The database is built once from an introspection dump emitted by the
//! interpreter and is immutable afterwards, so the engine shares it behind a
//! plain `Arc` with no locking. Classes and methods live in arenas addressed
//! by copyable ids; class-side methods are owned by a synthesized metaclass
//! (`Meta_<name>`) whose superclass link mirrors the instance-side hierarchy.
//!
//! Lookup surfaces:
//! - class table: ordered by name, supports prefix-range queries
//! - flattened method table: ordered by name, one entry per (name, owner)

use std::collections::BTreeMap;
use std::ops::Bound;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Arena index of a class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClassId(u32);

/// Arena index of a method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MethodId(u32);

#[derive(Debug, Clone)]
pub struct ArgumentDescriptor {
    pub name: String,
    /// Source text of the default value, when the declaration has one.
    pub default_value: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MethodDescriptor {
    pub name: String,
    pub owner: ClassId,
    pub arguments: Vec<ArgumentDescriptor>,
}

impl MethodDescriptor {
    /// Human-readable signature for the argument-hint tooltip, e.g.
    /// `play(freq = 440, amp = 1.0)`.
    pub fn signature(&self) -> String {
        let mut text = String::from(&self.name);
        text.push('(');
        for (i, arg) in self.arguments.iter().enumerate() {
            if i > 0 {
                text.push_str(", ");
            }
            text.push_str(&arg.name);
            if let Some(default) = &arg.default_value {
                text.push_str(" = ");
                text.push_str(default);
            }
        }
        text.push(')');
        text
    }
}

#[derive(Debug, Clone)]
pub struct ClassDescriptor {
    pub name: String,
    /// True for the synthesized class-side (`Meta_*`) descriptors.
    pub is_meta: bool,
    pub superclass: Option<ClassId>,
    /// Class-side counterpart; `None` on metaclasses themselves.
    pub metaclass: Option<ClassId>,
    /// Methods declared directly on this class, in declaration order.
    pub methods: Vec<MethodId>,
}

/// Errors raised while linking an introspection dump into a database.
#[derive(Debug, Error)]
pub enum SymbolLoadError {
    #[error("malformed symbol dump: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("class `{0}` declared more than once")]
    DuplicateClass(String),
    #[error("class `{class}` references unknown superclass `{superclass}`")]
    UnknownSuperclass { class: String, superclass: String },
}

/// Introspection dump as emitted by the interpreter, before linking.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SymbolDump {
    pub classes: Vec<ClassDump>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassDump {
    pub name: String,
    #[serde(default)]
    pub superclass: Option<String>,
    #[serde(default)]
    pub instance_methods: Vec<MethodDump>,
    #[serde(default)]
    pub class_methods: Vec<MethodDump>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodDump {
    pub name: String,
    #[serde(default)]
    pub arguments: Vec<ArgumentDump>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArgumentDump {
    pub name: String,
    #[serde(default)]
    pub default_value: Option<String>,
}

impl ClassDump {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            superclass: None,
            instance_methods: Vec::new(),
            class_methods: Vec::new(),
        }
    }

    pub fn with_superclass(mut self, name: impl Into<String>) -> Self {
        self.superclass = Some(name.into());
        self
    }

    pub fn instance_method(mut self, method: MethodDump) -> Self {
        self.instance_methods.push(method);
        self
    }

    pub fn class_method(mut self, method: MethodDump) -> Self {
        self.class_methods.push(method);
        self
    }
}

impl MethodDump {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), arguments: Vec::new() }
    }

    pub fn arg(mut self, name: impl Into<String>, default_value: Option<&str>) -> Self {
        self.arguments.push(ArgumentDump {
            name: name.into(),
            default_value: default_value.map(str::to_owned),
        });
        self
    }
}

/// The linked, queryable database. All queries are pure reads.
#[derive(Debug, Default)]
pub struct SymbolDatabase {
    classes: Vec<ClassDescriptor>,
    methods: Vec<MethodDescriptor>,
    class_names: BTreeMap<String, ClassId>,
    method_names: BTreeMap<String, Vec<MethodId>>,
}

impl SymbolDatabase {
    /// Parse and link a JSON introspection dump.
    pub fn from_json_str(json: &str) -> Result<Self, SymbolLoadError> {
        let dump: SymbolDump = serde_json::from_str(json)?;
        Self::from_dump(dump)
    }

    /// Link a dump: resolve superclass names, synthesize metaclasses and
    /// build the ordered lookup tables.
    pub fn from_dump(dump: SymbolDump) -> Result<Self, SymbolLoadError> {
        let mut db = Self::default();

        // First pass: allocate instance classes and their metaclasses so
        // that name resolution sees every class regardless of dump order.
        let mut instance_ids = Vec::with_capacity(dump.classes.len());
        for class in &dump.classes {
            if db.class_names.contains_key(&class.name) {
                return Err(SymbolLoadError::DuplicateClass(class.name.clone()));
            }
            // The Meta_ namespace belongs to synthesized metaclasses; a dump
            // class landing on one of those names would be shadowed in the
            // name table.
            let meta_name = format!("Meta_{}", class.name);
            if db.class_names.contains_key(&meta_name) {
                return Err(SymbolLoadError::DuplicateClass(meta_name));
            }
            let meta_id = db.push_class(ClassDescriptor {
                name: meta_name,
                is_meta: true,
                superclass: None,
                metaclass: None,
                methods: Vec::new(),
            });
            let id = db.push_class(ClassDescriptor {
                name: class.name.clone(),
                is_meta: false,
                superclass: None,
                metaclass: Some(meta_id),
                methods: Vec::new(),
            });
            instance_ids.push((id, meta_id));
        }

        // Second pass: link superclasses (instance side and the mirrored
        // metaclass chain) and attach methods.
        for (class, &(id, meta_id)) in dump.classes.iter().zip(&instance_ids) {
            if let Some(super_name) = &class.superclass {
                let super_id = db.find_class(super_name).ok_or_else(|| {
                    SymbolLoadError::UnknownSuperclass {
                        class: class.name.clone(),
                        superclass: super_name.clone(),
                    }
                })?;
                db.classes[id.0 as usize].superclass = Some(super_id);
                db.classes[meta_id.0 as usize].superclass =
                    db.classes[super_id.0 as usize].metaclass;
            }
            for method in &class.instance_methods {
                db.push_method(id, method);
            }
            for method in &class.class_methods {
                db.push_method(meta_id, method);
            }
        }

        Ok(db)
    }

    fn push_class(&mut self, class: ClassDescriptor) -> ClassId {
        let id = ClassId(self.classes.len() as u32);
        self.class_names.insert(class.name.clone(), id);
        self.classes.push(class);
        id
    }

    fn push_method(&mut self, owner: ClassId, dump: &MethodDump) {
        let id = MethodId(self.methods.len() as u32);
        self.methods.push(MethodDescriptor {
            name: dump.name.clone(),
            owner,
            arguments: dump
                .arguments
                .iter()
                .map(|a| ArgumentDescriptor {
                    name: a.name.clone(),
                    default_value: a.default_value.clone(),
                })
                .collect(),
        });
        self.classes[owner.0 as usize].methods.push(id);
        self.method_names.entry(dump.name.clone()).or_default().push(id);
    }

    pub fn class(&self, id: ClassId) -> &ClassDescriptor {
        &self.classes[id.0 as usize]
    }

    pub fn method(&self, id: MethodId) -> &MethodDescriptor {
        &self.methods[id.0 as usize]
    }

    pub fn find_class(&self, name: &str) -> Option<ClassId> {
        self.class_names.get(name).copied()
    }

    /// Name of the class that owns a method.
    pub fn owner_name(&self, id: MethodId) -> &str {
        &self.class(self.method(id).owner).name
    }

    /// Whether the method is class-side (owned by a metaclass).
    pub fn is_class_method(&self, id: MethodId) -> bool {
        self.class(self.method(id).owner).is_meta
    }

    /// Whether `sub` transitively inherits from `ancestor` (strict: a class
    /// is not its own subclass).
    pub fn is_subclass_of(&self, sub: ClassId, ancestor: ClassId) -> bool {
        let mut current = self.class(sub).superclass;
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.class(id).superclass;
        }
        false
    }

    /// Class names in `[min, max)`, in name order. `max = None` means
    /// unbounded above.
    pub fn class_range<'a>(
        &'a self,
        min: &str,
        max: Option<&str>,
    ) -> impl Iterator<Item = (&'a str, ClassId)> + 'a {
        let upper = match max {
            Some(max) => Bound::Excluded(max.to_owned()),
            None => Bound::Unbounded,
        };
        self.class_names
            .range::<String, _>((Bound::Included(min.to_owned()), upper))
            .map(|(name, &id)| (name.as_str(), id))
    }

    /// All methods sharing a name, in dump order.
    pub fn methods_named(&self, name: &str) -> &[MethodId] {
        self.method_names.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Method-table entries with names in `[min, max)`, grouped by name.
    pub fn method_range<'a>(
        &'a self,
        min: &str,
        max: Option<&str>,
    ) -> impl Iterator<Item = (&'a str, &'a [MethodId])> + 'a {
        let upper = match max {
            Some(max) => Bound::Excluded(max.to_owned()),
            None => Bound::Unbounded,
        };
        self.method_names
            .range::<String, _>((Bound::Included(min.to_owned()), upper))
            .map(|(name, ids)| (name.as_str(), ids.as_slice()))
    }

    /// The whole flattened method table in name order.
    pub fn all_methods(&self) -> impl Iterator<Item = MethodId> + '_ {
        self.method_names.values().flat_map(|ids| ids.iter().copied())
    }
}
