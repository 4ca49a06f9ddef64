use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Whether a source file only declares types or also carries script code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceKind {
    Class,
    Script,
}

impl SourceKind {
    /// Returns the string representation of this source kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Class => "class",
            SourceKind::Script => "script",
        }
    }
}

/// Kinds of type declarations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassKind {
    Class,
    Interface,
    Enum,
    Annotation,
}

#[allow(clippy::should_implement_trait)]
impl ClassKind {
    /// Returns the declaration keyword used in Java source.
    pub fn keyword(&self) -> &'static str {
        match self {
            ClassKind::Class => "class",
            ClassKind::Interface => "interface",
            ClassKind::Enum => "enum",
            ClassKind::Annotation => "@interface",
        }
    }

    /// Parses a declaration keyword into a `ClassKind`.
    pub fn from_keyword(s: &str) -> Option<ClassKind> {
        match s {
            "class" => Some(ClassKind::Class),
            "interface" => Some(ClassKind::Interface),
            "enum" => Some(ClassKind::Enum),
            "@interface" => Some(ClassKind::Annotation),
            _ => None,
        }
    }

    /// Interfaces and annotation types share the "no state, no bodies" rules.
    pub fn is_interface_like(&self) -> bool {
        matches!(self, ClassKind::Interface | ClassKind::Annotation)
    }
}

// ---------------------------------------------------------------------------
// Modifiers
// ---------------------------------------------------------------------------

/// A single declaration modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Modifier {
    Public,
    Protected,
    Private,
    Abstract,
    Static,
    Final,
    Synchronized,
    Transient,
    Volatile,
    Native,
    Strictfp,
}

#[allow(clippy::should_implement_trait)]
impl Modifier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Modifier::Public => "public",
            Modifier::Protected => "protected",
            Modifier::Private => "private",
            Modifier::Abstract => "abstract",
            Modifier::Static => "static",
            Modifier::Final => "final",
            Modifier::Synchronized => "synchronized",
            Modifier::Transient => "transient",
            Modifier::Volatile => "volatile",
            Modifier::Native => "native",
            Modifier::Strictfp => "strictfp",
        }
    }

    pub fn from_str(s: &str) -> Option<Modifier> {
        match s {
            "public" => Some(Modifier::Public),
            "protected" => Some(Modifier::Protected),
            "private" => Some(Modifier::Private),
            "abstract" => Some(Modifier::Abstract),
            "static" => Some(Modifier::Static),
            "final" => Some(Modifier::Final),
            "synchronized" => Some(Modifier::Synchronized),
            "transient" => Some(Modifier::Transient),
            "volatile" => Some(Modifier::Volatile),
            "native" => Some(Modifier::Native),
            "strictfp" => Some(Modifier::Strictfp),
            _ => None,
        }
    }

    /// Returns `true` for `public`, `protected` and `private`.
    pub fn is_access(&self) -> bool {
        matches!(
            self,
            Modifier::Public | Modifier::Protected | Modifier::Private
        )
    }
}

/// Insertion-ordered set of modifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifierSet {
    modifiers: Vec<Modifier>,
}

impl ModifierSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a modifier, returning `false` if it was already present.
    pub fn insert(&mut self, modifier: Modifier) -> bool {
        if self.modifiers.contains(&modifier) {
            return false;
        }
        self.modifiers.push(modifier);
        true
    }

    pub fn contains(&self, modifier: Modifier) -> bool {
        self.modifiers.contains(&modifier)
    }

    pub fn iter(&self) -> impl Iterator<Item = Modifier> + '_ {
        self.modifiers.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.modifiers.is_empty()
    }

    /// Returns `true` if any of `public`, `protected` or `private` is present.
    pub fn has_access_modifier(&self) -> bool {
        self.modifiers.iter().any(Modifier::is_access)
    }

    /// Returns a copy with `access` placed first when no access modifier is
    /// present. The receiver is left untouched.
    pub fn with_default_access(&self, access: Modifier) -> ModifierSet {
        if self.has_access_modifier() {
            return self.clone();
        }
        let mut modifiers = Vec::with_capacity(self.modifiers.len() + 1);
        modifiers.push(access);
        modifiers.extend(self.modifiers.iter().copied());
        ModifierSet { modifiers }
    }

    /// Returns a copy whose access modifier is replaced by `access`.
    pub fn with_access(&self, access: Modifier) -> ModifierSet {
        let mut modifiers = vec![access];
        modifiers.extend(self.modifiers.iter().copied().filter(|m| !m.is_access()));
        ModifierSet { modifiers }
    }

    /// Returns a copy without any of the given modifiers.
    pub fn without(&self, removed: &[Modifier]) -> ModifierSet {
        ModifierSet {
            modifiers: self
                .modifiers
                .iter()
                .copied()
                .filter(|m| !removed.contains(m))
                .collect(),
        }
    }
}

impl FromIterator<Modifier> for ModifierSet {
    fn from_iter<I: IntoIterator<Item = Modifier>>(iter: I) -> Self {
        let mut set = ModifierSet::new();
        for modifier in iter {
            set.insert(modifier);
        }
        set
    }
}

impl fmt::Display for ModifierSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let words: Vec<&str> = self.modifiers.iter().map(Modifier::as_str).collect();
        f.write_str(&words.join(" "))
    }
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Name used for untyped (`def`) declarations.
pub const DYNAMIC_TYPE: &str = "java.lang.Object";

/// A reference to a type: a name plus an array-dimension count.
///
/// `name` is `None` for untyped declarations, which render as
/// `java.lang.Object`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeRef {
    pub name: Option<String>,
    pub dimensions: usize,
}

impl TypeRef {
    /// Creates a type reference, canonicalizing `Object` and `String`.
    pub fn new(name: &str, dimensions: usize) -> Self {
        let name = match name {
            "Object" => DYNAMIC_TYPE.to_string(),
            "String" => "java.lang.String".to_string(),
            other => other.to_string(),
        };
        Self {
            name: Some(name),
            dimensions,
        }
    }

    pub fn named(name: &str) -> Self {
        Self::new(name, 0)
    }

    /// The placeholder used for `def` and for missing declared types.
    pub fn dynamic() -> Self {
        Self {
            name: None,
            dimensions: 0,
        }
    }

    pub fn void() -> Self {
        Self::named("void")
    }

    /// The element type name, `java.lang.Object` for untyped references.
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or(DYNAMIC_TYPE)
    }

    pub fn is_dynamic(&self) -> bool {
        self.name.is_none()
    }

    pub fn is_array(&self) -> bool {
        self.dimensions > 0
    }

    pub fn is_void(&self) -> bool {
        self.dimensions == 0 && self.name() == "void"
    }

    /// `true` only for the primitive `boolean`, not `java.lang.Boolean`.
    pub fn is_boolean(&self) -> bool {
        self.dimensions == 0 && self.name() == "boolean"
    }

    pub fn is_primitive(&self) -> bool {
        self.dimensions == 0
            && matches!(
                self.name(),
                "boolean" | "byte" | "char" | "short" | "int" | "long" | "float" | "double"
            )
    }

    /// Returns a copy with `extra` more array dimensions.
    pub fn with_extra_dimensions(&self, extra: usize) -> Self {
        Self {
            name: self.name.clone(),
            dimensions: self.dimensions + extra,
        }
    }

    /// The literal a variable of this type is initialized with in a stub.
    pub fn default_value(&self) -> &'static str {
        if self.is_array() {
            return "null";
        }
        match self.name() {
            "int" | "short" | "byte" => "0",
            "long" => "0L",
            "float" => "0.0f",
            "double" => "0.0d",
            "boolean" => "false",
            "char" => "'\\u0000'",
            _ => "null",
        }
    }

    /// The name used in signature keys: element name plus `[]` per dimension.
    pub fn signature_name(&self) -> String {
        format!("{}{}", self.name(), "[]".repeat(self.dimensions))
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.signature_name())
    }
}

// ---------------------------------------------------------------------------
// Javadoc
// ---------------------------------------------------------------------------

/// A single `@tag value` entry of a javadoc block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JavaDocTag {
    pub name: String,
    pub value: String,
}

/// A parsed `/** ... */` block: free text followed by ordered tags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JavaDoc {
    pub comment: String,
    pub tags: Vec<JavaDocTag>,
}

impl JavaDoc {
    pub fn is_empty(&self) -> bool {
        self.comment.is_empty() && self.tags.is_empty()
    }

    /// Returns the values of all tags with the given name, in order.
    pub fn tag_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.tags
            .iter()
            .filter(move |t| t.name == name)
            .map(|t| t.value.as_str())
    }
}

// ---------------------------------------------------------------------------
// Declarations
// ---------------------------------------------------------------------------

/// An import declaration. Exactly one of `type_name` and `wildcard` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportDecl {
    pub is_static: bool,
    pub package: Option<String>,
    pub type_name: Option<String>,
    pub wildcard: bool,
    pub alias: Option<String>,
}

impl ImportDecl {
    /// The imported name without the trailing `.*` of wildcard imports.
    pub fn qualified_name(&self) -> String {
        match (&self.package, &self.type_name) {
            (Some(package), Some(type_name)) => format!("{}.{}", package, type_name),
            (None, Some(type_name)) => type_name.clone(),
            (Some(package), None) => package.clone(),
            (None, None) => String::new(),
        }
    }
}

/// A method or constructor parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterDecl {
    pub name: String,
    pub type_ref: TypeRef,
    pub modifiers: ModifierSet,
}

impl ParameterDecl {
    pub fn new(name: &str, type_ref: TypeRef) -> Self {
        Self {
            name: name.to_string(),
            type_ref,
            modifiers: ModifierSet::new(),
        }
    }
}

/// Target of a constructor's leading delegation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DelegationTarget {
    Super,
    This,
}

impl DelegationTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            DelegationTarget::Super => "super",
            DelegationTarget::This => "this",
        }
    }
}

/// One argument of a delegation call with its best-effort static type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegationArg {
    pub text: String,
    pub type_ref: Option<TypeRef>,
}

impl DelegationArg {
    pub fn is_typed(&self) -> bool {
        self.type_ref.is_some()
    }
}

/// A leading `super(...)` or `this(...)` call of a constructor body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delegation {
    pub target: DelegationTarget,
    pub args: Vec<DelegationArg>,
}

impl Delegation {
    /// `true` when every argument has a resolved type.
    pub fn is_fully_typed(&self) -> bool {
        self.args.iter().all(DelegationArg::is_typed)
    }
}

/// A field declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    pub type_ref: TypeRef,
    pub modifiers: ModifierSet,
    pub javadoc: Option<JavaDoc>,
}

impl FieldDecl {
    pub fn new(name: &str, type_ref: TypeRef, modifiers: ModifierSet) -> Self {
        Self {
            name: name.to_string(),
            type_ref,
            modifiers,
            javadoc: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MethodKind {
    Method,
    Constructor,
}

/// A method or constructor declaration.
///
/// Constructors carry the name of their class and no return type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDecl {
    pub kind: MethodKind,
    pub name: String,
    pub return_type: Option<TypeRef>,
    pub parameters: Vec<ParameterDecl>,
    pub throws: Vec<TypeRef>,
    pub modifiers: ModifierSet,
    pub javadoc: Option<JavaDoc>,
    /// Set for constructors synthesized by the renderer.
    pub magic: bool,
    pub delegation: Option<Delegation>,
}

impl MethodDecl {
    pub fn method(name: &str, return_type: TypeRef, modifiers: ModifierSet) -> Self {
        Self {
            kind: MethodKind::Method,
            name: name.to_string(),
            return_type: Some(return_type),
            parameters: Vec::new(),
            throws: Vec::new(),
            modifiers,
            javadoc: None,
            magic: false,
            delegation: None,
        }
    }

    pub fn constructor(class_name: &str, modifiers: ModifierSet) -> Self {
        Self {
            kind: MethodKind::Constructor,
            name: class_name.to_string(),
            return_type: None,
            parameters: Vec::new(),
            throws: Vec::new(),
            modifiers,
            javadoc: None,
            magic: false,
            delegation: None,
        }
    }

    pub fn is_constructor(&self) -> bool {
        self.kind == MethodKind::Constructor
    }

    /// Name plus comma-joined parameter type names, e.g. `setCount(int)`.
    ///
    /// The return type is not part of the key.
    pub fn signature(&self) -> String {
        let types: Vec<String> = self
            .parameters
            .iter()
            .map(|p| p.type_ref.signature_name())
            .collect();
        signature_key(&self.name, &types)
    }
}

/// Builds a signature key from a name and parameter type names.
pub fn signature_key<S: AsRef<str>>(name: &str, parameter_types: &[S]) -> String {
    let types: Vec<&str> = parameter_types.iter().map(AsRef::as_ref).collect();
    format!("{}({})", name, types.join(","))
}

/// A type declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDecl {
    pub kind: ClassKind,
    pub name: String,
    pub modifiers: ModifierSet,
    pub superclass: Option<TypeRef>,
    /// Implemented interfaces for classes and enums, extended interfaces for
    /// interfaces and annotation types.
    pub interfaces: Vec<TypeRef>,
    pub enum_constants: Vec<String>,
    pub fields: Vec<FieldDecl>,
    pub methods: Vec<MethodDecl>,
    pub javadoc: Option<JavaDoc>,
}

impl ClassDecl {
    pub fn new(kind: ClassKind, name: &str) -> Self {
        Self {
            kind,
            name: name.to_string(),
            modifiers: ModifierSet::new(),
            superclass: None,
            interfaces: Vec::new(),
            enum_constants: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            javadoc: None,
        }
    }

    pub fn is_interface(&self) -> bool {
        self.kind == ClassKind::Interface
    }

    /// A field is a property when it sits in a class or enum and declares
    /// none of `public`, `protected` or `private`.
    pub fn is_property(&self, field: &FieldDecl) -> bool {
        !self.kind.is_interface_like() && !field.modifiers.has_access_modifier()
    }

    pub fn constructors(&self) -> impl Iterator<Item = &MethodDecl> {
        self.methods.iter().filter(|m| m.is_constructor())
    }

    /// Signatures of all declared methods and constructors.
    pub fn declared_signatures(&self) -> BTreeSet<String> {
        self.methods.iter().map(MethodDecl::signature).collect()
    }

    /// Adds an implemented interface unless an identical one is present.
    pub fn add_interface(&mut self, interface: TypeRef) {
        if !self.interfaces.contains(&interface) {
            self.interfaces.push(interface);
        }
    }
}

/// The model of one Groovy source: its package, imports and type declarations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    pub location: String,
    pub kind: SourceKind,
    pub package: Option<String>,
    pub imports: Vec<ImportDecl>,
    pub classes: Vec<ClassDecl>,
}

impl SourceFile {
    pub fn new(location: &str) -> Self {
        Self {
            location: location.to_string(),
            kind: SourceKind::Class,
            package: None,
            imports: Vec::new(),
            classes: Vec::new(),
        }
    }

    /// Adds an import unless an identical one was already declared.
    pub fn add_import(&mut self, import: ImportDecl) {
        if !self.imports.contains(&import) {
            self.imports.push(import);
        }
    }

    pub fn add_class(&mut self, class: ClassDecl) {
        self.classes.push(class);
    }

    /// Finds the import that introduces `alias` as a type name.
    pub fn import_for_alias(&self, alias: &str) -> Option<&ImportDecl> {
        self.imports
            .iter()
            .find(|i| i.alias.as_deref() == Some(alias))
    }

    /// Relative output path of a class stub: package path plus `Name.ext`.
    pub fn stub_path(&self, class: &ClassDecl, extension: &str) -> std::path::PathBuf {
        let mut path = std::path::PathBuf::new();
        if let Some(package) = &self.package {
            for segment in package.split('.') {
                path.push(segment);
            }
        }
        path.push(format!("{}.{}", class.name, extension));
        path
    }
}
