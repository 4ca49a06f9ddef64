/// Synthesized members: property accessors, magic constructors and the
/// runtime object protocol.
///
/// Everything here builds new declarations from the parsed ones. The model
/// is only read, and collision checks always go against the signature set
/// of the declared members.
use std::collections::BTreeSet;

use crate::types::*;

/// Number of `java.lang.Void` parameters every magic constructor starts with.
pub const SENTINEL_COUNT: usize = 3;

/// Type of the fixed sentinel parameters.
pub const SENTINEL_TYPE: &str = "java.lang.Void";

/// Parameter name used by synthesized setters.
const SETTER_PARAMETER: &str = "value";

/// The members a property field expands to.
#[derive(Debug, Clone)]
pub struct PropertyMembers {
    /// Private copy of the field, javadoc preserved.
    pub field: FieldDecl,
    pub getter: Option<MethodDecl>,
    /// `isName()`, only for fields typed exactly `boolean`.
    pub is_getter: Option<MethodDecl>,
    /// Absent for final fields.
    pub setter: Option<MethodDecl>,
}

impl PropertyMembers {
    /// The synthesized accessor methods in emission order.
    pub fn methods(&self) -> impl Iterator<Item = &MethodDecl> {
        self.getter
            .iter()
            .chain(self.is_getter.iter())
            .chain(self.setter.iter())
    }
}

/// `count` -> `Count`.
pub fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Expands a property field into a private field and its accessors.
///
/// An accessor whose signature is already declared is left out.
pub fn property_members(field: &FieldDecl, declared: &BTreeSet<String>) -> PropertyMembers {
    let mut private_field = field.clone();
    private_field.modifiers = field.modifiers.with_access(Modifier::Private);

    let accessor_modifiers = field
        .modifiers
        .without(&[Modifier::Transient, Modifier::Volatile])
        .with_access(Modifier::Public);
    let suffix = capitalize(&field.name);

    let accessor = |name: String| {
        let method = MethodDecl::method(&name, field.type_ref.clone(), accessor_modifiers.clone());
        (!declared.contains(&method.signature())).then_some(method)
    };

    let getter = accessor(format!("get{}", suffix));
    let is_getter = if field.type_ref.is_boolean() {
        accessor(format!("is{}", suffix))
    } else {
        None
    };

    let setter = if field.modifiers.contains(Modifier::Final) {
        None
    } else {
        let mut method = MethodDecl::method(
            &format!("set{}", suffix),
            TypeRef::void(),
            accessor_modifiers.clone(),
        );
        method
            .parameters
            .push(ParameterDecl::new(SETTER_PARAMETER, field.type_ref.clone()));
        (!declared.contains(&method.signature())).then_some(method)
    };

    PropertyMembers {
        field: private_field,
        getter,
        is_getter,
        setter,
    }
}

// ---------------------------------------------------------------------------
// Magic constructors
// ---------------------------------------------------------------------------

/// The magic constructors of one class, keyed by thrown-type list.
#[derive(Debug, Clone, Default)]
pub struct MagicConstructors {
    constructors: Vec<MethodDecl>,
}

impl MagicConstructors {
    /// Plans the magic constructors of `class`.
    ///
    /// Nothing is planned for interfaces, annotation types, or classes that
    /// declare no constructor. Otherwise there is one magic constructor per
    /// distinct thrown-type list, plus the default one (sentinels only) when
    /// some declared constructor throws nothing.
    pub fn plan(class: &ClassDecl) -> Self {
        if class.kind.is_interface_like() {
            return Self::default();
        }
        let declared: Vec<&MethodDecl> = class.constructors().filter(|c| !c.magic).collect();
        if declared.is_empty() {
            return Self::default();
        }

        let super_call = select_super_delegation(class);
        let mut keys: Vec<Vec<TypeRef>> = Vec::new();
        for ctor in &declared {
            let key = distinct_throws(ctor);
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        // Enum constants call the default one when no declared constructor
        // takes zero arguments.
        if class.kind == ClassKind::Enum
            && !declared.iter().any(|c| c.parameters.is_empty())
            && !keys.iter().any(Vec::is_empty)
        {
            keys.push(Vec::new());
        }
        // The default one goes first so that the plain case reads naturally.
        keys.sort_by_key(|k| !k.is_empty());

        let constructors = keys
            .into_iter()
            .map(|thrown| magic_constructor(&class.name, thrown, super_call.clone()))
            .collect();
        Self { constructors }
    }

    pub fn iter(&self) -> impl Iterator<Item = &MethodDecl> {
        self.constructors.iter()
    }

    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }

    /// The `this(...)` call a declared constructor uses to reach its magic
    /// counterpart: typed nulls for the sentinels and each thrown type.
    pub fn delegation_for(&self, ctor: &MethodDecl) -> Option<Delegation> {
        let thrown = distinct_throws(ctor);
        let target = self
            .constructors
            .iter()
            .find(|m| m.throws == thrown)?;
        Some(Delegation {
            target: DelegationTarget::This,
            args: null_arguments(target),
        })
    }

    /// Arguments every constant of an enum passes when the enum declares
    /// constructors but none without parameters: the sentinels of the
    /// default magic constructor.
    pub fn enum_constant_arguments(&self, class: &ClassDecl) -> Option<Vec<DelegationArg>> {
        if class.kind != ClassKind::Enum
            || class
                .constructors()
                .any(|c| !c.magic && c.parameters.is_empty())
        {
            return None;
        }
        self.constructors
            .iter()
            .find(|m| m.throws.is_empty())
            .map(null_arguments)
    }
}

/// One typed `null` per parameter of `target`.
fn null_arguments(target: &MethodDecl) -> Vec<DelegationArg> {
    target
        .parameters
        .iter()
        .map(|p| DelegationArg {
            text: "null".to_string(),
            type_ref: Some(p.type_ref.clone()),
        })
        .collect()
}

fn magic_constructor(
    class_name: &str,
    thrown: Vec<TypeRef>,
    super_call: Option<Delegation>,
) -> MethodDecl {
    let mut ctor = MethodDecl::constructor(class_name, [Modifier::Private].into_iter().collect());
    ctor.magic = true;
    for i in 0..SENTINEL_COUNT {
        ctor.parameters.push(ParameterDecl::new(
            &format!("sentinel{}", i),
            TypeRef::named(SENTINEL_TYPE),
        ));
    }
    for (i, thrown_type) in thrown.iter().enumerate() {
        ctor.parameters
            .push(ParameterDecl::new(&format!("thrown{}", i), thrown_type.clone()));
    }
    ctor.throws = thrown;
    ctor.delegation = super_call;
    ctor
}

/// Thrown types of a constructor with duplicates removed, in order.
fn distinct_throws(ctor: &MethodDecl) -> Vec<TypeRef> {
    let mut thrown: Vec<TypeRef> = Vec::new();
    for t in &ctor.throws {
        if !thrown.contains(t) {
            thrown.push(t.clone());
        }
    }
    thrown
}

/// The first `super(...)` call among the declared constructors whose every
/// argument has a resolved type. Enums never get one.
pub fn select_super_delegation(class: &ClassDecl) -> Option<Delegation> {
    if class.kind == ClassKind::Enum {
        return None;
    }
    class
        .constructors()
        .filter(|c| !c.magic)
        .filter_map(|c| c.delegation.as_ref())
        .find(|d| d.target == DelegationTarget::Super && d.is_fully_typed())
        .cloned()
}

// ---------------------------------------------------------------------------
// Runtime object protocol
// ---------------------------------------------------------------------------

const META_CLASS: &str = "groovy.lang.MetaClass";

/// `getMetaClass`, `setMetaClass`, `invokeMethod`, `getProperty` and
/// `setProperty`, in that order, minus the ones already declared.
pub fn protocol_methods(class: &ClassDecl, declared: &BTreeSet<String>) -> Vec<MethodDecl> {
    if class.kind.is_interface_like() {
        return Vec::new();
    }
    let public: ModifierSet = [Modifier::Public].into_iter().collect();
    let string = || TypeRef::named("String");
    let object = || TypeRef::named(DYNAMIC_TYPE);

    let protocol: [(&str, TypeRef, Vec<(&str, TypeRef)>); 5] = [
        ("getMetaClass", TypeRef::named(META_CLASS), vec![]),
        (
            "setMetaClass",
            TypeRef::void(),
            vec![("metaClass", TypeRef::named(META_CLASS))],
        ),
        (
            "invokeMethod",
            object(),
            vec![("name", string()), ("args", object())],
        ),
        ("getProperty", object(), vec![("property", string())]),
        (
            "setProperty",
            TypeRef::void(),
            vec![("property", string()), ("value", object())],
        ),
    ];

    protocol
        .into_iter()
        .map(|(name, return_type, parameters)| {
            let mut method = MethodDecl::method(name, return_type, public.clone());
            method.parameters = parameters
                .into_iter()
                .map(|(p, t)| ParameterDecl::new(p, t))
                .collect();
            method
        })
        .filter(|m| {
            !declared.contains(&m.signature()) && !declared.contains(&simple_signature(m))
        })
        .collect()
}

/// Signature key with every parameter type reduced to its simple name, so a
/// declared `setMetaClass(MetaClass)` matches `setMetaClass(groovy.lang.MetaClass)`.
fn simple_signature(method: &MethodDecl) -> String {
    let types: Vec<String> = method
        .parameters
        .iter()
        .map(|p| {
            let name = p.type_ref.signature_name();
            match name.rsplit_once('.') {
                Some((_, simple)) => simple.to_string(),
                None => name,
            }
        })
        .collect();
    signature_key(&method.name, &types)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(name: &str, type_name: &str, modifiers: &[Modifier]) -> FieldDecl {
        FieldDecl::new(
            name,
            TypeRef::named(type_name),
            modifiers.iter().copied().collect(),
        )
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("count"), "Count");
        assert_eq!(capitalize("URL"), "URL");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn test_property_accessor_modifiers() {
        let members = property_members(
            &field("cache", "int", &[Modifier::Static, Modifier::Transient]),
            &BTreeSet::new(),
        );
        assert_eq!(members.field.modifiers.to_string(), "private static transient");
        let getter = members.getter.unwrap();
        assert_eq!(getter.modifiers.to_string(), "public static");
        assert!(members.is_getter.is_none());
        assert!(members.setter.is_some());
    }

    #[test]
    fn test_final_property_has_no_setter() {
        let members = property_members(
            &field("enabled", "boolean", &[Modifier::Final]),
            &BTreeSet::new(),
        );
        assert!(members.getter.is_some());
        assert!(members.is_getter.is_some());
        assert!(members.setter.is_none());
        assert_eq!(members.methods().count(), 2);
    }

    #[test]
    fn test_boxed_boolean_has_no_is_getter() {
        let members = property_members(&field("flag", "Boolean", &[]), &BTreeSet::new());
        assert!(members.is_getter.is_none());
    }

    #[test]
    fn test_setter_collision_uses_parameter_types() {
        let declared: BTreeSet<String> = ["setCount(int)".to_string()].into_iter().collect();
        let members = property_members(&field("count", "int", &[]), &declared);
        assert!(members.setter.is_none());
        assert!(members.getter.is_some());
    }

    #[test]
    fn test_magic_plan_keys_by_thrown_list() {
        let mut class = ClassDecl::new(ClassKind::Class, "A");
        let plain = MethodDecl::constructor("A", ModifierSet::new());
        let mut throwing = MethodDecl::constructor("A", ModifierSet::new());
        throwing.parameters.push(ParameterDecl::new("x", TypeRef::named("int")));
        throwing.throws = vec![TypeRef::named("IOException"), TypeRef::named("IOException")];
        class.methods = vec![throwing.clone(), plain.clone()];

        let plan = MagicConstructors::plan(&class);
        assert_eq!(plan.len(), 2);
        let counts: Vec<usize> = plan.iter().map(|m| m.parameters.len()).collect();
        assert_eq!(counts, vec![3, 4]);

        let delegation = plan.delegation_for(&throwing).unwrap();
        assert_eq!(delegation.target, DelegationTarget::This);
        assert_eq!(delegation.args.len(), 4);
        assert_eq!(plan.delegation_for(&plain).unwrap().args.len(), 3);
    }

    #[test]
    fn test_enum_without_no_arg_constructor_gets_default_magic() {
        let mut class = ClassDecl::new(ClassKind::Enum, "Color");
        let mut ctor = MethodDecl::constructor("Color", ModifierSet::new());
        ctor.parameters.push(ParameterDecl::new("code", TypeRef::named("int")));
        ctor.throws = vec![TypeRef::named("IOException")];
        class.methods = vec![ctor];

        let plan = MagicConstructors::plan(&class);
        assert_eq!(plan.len(), 2);
        let args = plan.enum_constant_arguments(&class).unwrap();
        assert_eq!(args.len(), SENTINEL_COUNT);
        assert!(args
            .iter()
            .all(|a| a.type_ref == Some(TypeRef::named(SENTINEL_TYPE))));

        class.methods.push(MethodDecl::constructor("Color", ModifierSet::new()));
        let plan = MagicConstructors::plan(&class);
        assert!(plan.enum_constant_arguments(&class).is_none());
    }

    #[test]
    fn test_no_magic_without_constructors() {
        let class = ClassDecl::new(ClassKind::Class, "A");
        assert!(MagicConstructors::plan(&class).is_empty());
    }

    #[test]
    fn test_super_selection_skips_untyped() {
        let mut class = ClassDecl::new(ClassKind::Class, "A");
        let mut untyped = MethodDecl::constructor("A", ModifierSet::new());
        untyped.delegation = Some(Delegation {
            target: DelegationTarget::Super,
            args: vec![DelegationArg {
                text: "x".to_string(),
                type_ref: None,
            }],
        });
        let mut typed = MethodDecl::constructor("A", ModifierSet::new());
        typed.delegation = Some(Delegation {
            target: DelegationTarget::Super,
            args: vec![DelegationArg {
                text: "1".to_string(),
                type_ref: Some(TypeRef::named("int")),
            }],
        });
        class.methods = vec![untyped, typed.clone()];
        assert_eq!(select_super_delegation(&class), typed.delegation);

        class.kind = ClassKind::Enum;
        assert!(select_super_delegation(&class).is_none());
    }

    #[test]
    fn test_protocol_methods_skip_declared() {
        let class = ClassDecl::new(ClassKind::Class, "A");
        let declared: BTreeSet<String> =
            ["getProperty(java.lang.String)".to_string()].into_iter().collect();
        let names: Vec<String> = protocol_methods(&class, &declared)
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(
            names,
            vec!["getMetaClass", "setMetaClass", "invokeMethod", "setProperty"]
        );
        let declared: BTreeSet<String> =
            ["setMetaClass(MetaClass)".to_string()].into_iter().collect();
        assert!(protocol_methods(&class, &declared)
            .iter()
            .all(|m| m.name != "setMetaClass"));

        let interface = ClassDecl::new(ClassKind::Interface, "I");
        assert!(protocol_methods(&interface, &BTreeSet::new()).is_empty());
    }
}
