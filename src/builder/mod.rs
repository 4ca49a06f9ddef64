/// Builds the source model from a parsed Groovy syntax tree.
///
/// The builder walks the tree in declaration order, dispatching on the
/// grammar rule of each node. Javadoc is recovered from the text between the
/// end of the previous declaration and the start of the current one.
mod delegation;
pub mod javadoc;

use std::path::Path;

use pest::iterators::Pair;

use crate::errors::{Result, StubError};
use crate::parser::{self, Rule, SyntaxTree};
use crate::types::*;

pub use delegation::literal_type;

/// Interface every Groovy class implements at runtime.
pub const GROOVY_OBJECT: &str = "groovy.lang.GroovyObject";

/// Superclass of the class synthesized for script sources.
pub const GROOVY_SCRIPT: &str = "groovy.lang.Script";

/// Walks one syntax tree into a `SourceFile`.
pub struct ModelBuilder<'t, 'i> {
    tree: &'t SyntaxTree<'i>,
    location: String,
    /// End offset of the previous declaration; javadoc search starts here.
    last_end: usize,
    /// Type parameters in scope, innermost last, each with its erasure.
    type_scopes: Vec<Vec<(String, TypeRef)>>,
}

/// Parses and builds a source in one step.
pub fn build_source(location: &str, source: &str) -> Result<SourceFile> {
    let tree = parser::parse(location, source)?;
    ModelBuilder::new(location, &tree).build()
}

impl<'t, 'i> ModelBuilder<'t, 'i> {
    pub fn new(location: &str, tree: &'t SyntaxTree<'i>) -> Self {
        Self {
            tree,
            location: location.to_string(),
            last_end: 0,
            type_scopes: Vec::new(),
        }
    }

    /// Builds the model of the whole compilation unit.
    pub fn build(mut self) -> Result<SourceFile> {
        let mut file = SourceFile::new(&self.location);
        let mut script_methods = Vec::new();
        let mut has_statements = false;

        for pair in self.tree.root().into_inner() {
            let end = pair.as_span().end();
            match pair.as_rule() {
                Rule::shebang | Rule::EOI => {}
                Rule::package_def => file.package = Some(self.read_package(pair)?),
                Rule::import_def => file.add_import(self.read_import(pair)?),
                Rule::type_def => {
                    let class = self.read_type_def(pair)?;
                    file.add_class(class);
                }
                Rule::script_method => script_methods.push(self.read_method(pair, None)?),
                Rule::script_statement => has_statements = true,
                _ => return Err(self.unexpected(&pair)),
            }
            self.last_end = end;
        }

        if has_statements || !script_methods.is_empty() {
            file.kind = SourceKind::Script;
            let script = self.script_class(&file, script_methods)?;
            file.add_class(script);
        }

        Ok(file)
    }

    // -----------------------------------------------------------------------
    // Package and imports
    // -----------------------------------------------------------------------

    /// The first non-annotation child of a package declaration is its name.
    fn read_package(&mut self, pair: Pair<'i, Rule>) -> Result<String> {
        for child in pair.clone().into_inner() {
            match child.as_rule() {
                Rule::annotation | Rule::kw_package => {}
                Rule::qualified_name => return Ok(child.as_str().to_string()),
                _ => return Err(self.unexpected(&child)),
            }
        }
        Err(self.error_at(&pair, "package declaration without a name"))
    }

    fn read_import(&mut self, pair: Pair<'i, Rule>) -> Result<ImportDecl> {
        let mut is_static = false;
        let mut name: Option<String> = None;
        let mut wildcard = false;
        let mut alias = None;

        for child in pair.clone().into_inner() {
            match child.as_rule() {
                Rule::annotation | Rule::kw_import | Rule::kw_as => {}
                Rule::kw_static => is_static = true,
                Rule::qualified_name => name = Some(child.as_str().to_string()),
                Rule::wildcard => wildcard = true,
                Rule::identifier => alias = Some(child.as_str().to_string()),
                _ => return Err(self.unexpected(&child)),
            }
        }

        let name = name.ok_or_else(|| self.error_at(&pair, "import without a name"))?;
        let import = if wildcard {
            ImportDecl {
                is_static,
                package: Some(name),
                type_name: None,
                wildcard: true,
                alias: None,
            }
        } else {
            let (package, type_name) = match name.rsplit_once('.') {
                Some((package, type_name)) => (Some(package.to_string()), type_name.to_string()),
                None => (None, name),
            };
            ImportDecl {
                is_static,
                package,
                type_name: Some(type_name),
                wildcard: false,
                alias,
            }
        };
        Ok(import)
    }

    // -----------------------------------------------------------------------
    // Type declarations
    // -----------------------------------------------------------------------

    fn read_type_def(&mut self, pair: Pair<'i, Rule>) -> Result<ClassDecl> {
        let inner = pair
            .clone()
            .into_inner()
            .next()
            .ok_or_else(|| self.error_at(&pair, "empty type declaration"))?;
        match inner.as_rule() {
            Rule::class_def | Rule::enum_def => self.read_class(inner),
            _ => Err(self.unexpected(&inner)),
        }
    }

    fn read_class(&mut self, pair: Pair<'i, Rule>) -> Result<ClassDecl> {
        let javadoc = self.javadoc_before(&pair);
        let mut class = ClassDecl::new(ClassKind::Class, "");
        class.javadoc = javadoc;

        let mut extends = Vec::new();
        let mut body = None;
        self.type_scopes.push(Vec::new());

        for child in pair.clone().into_inner() {
            match child.as_rule() {
                Rule::modifiers => class.modifiers = self.read_modifiers(child)?,
                Rule::class_keyword => {
                    class.kind = ClassKind::from_keyword(child.as_str())
                        .ok_or_else(|| self.unexpected(&child))?;
                }
                Rule::kw_enum => class.kind = ClassKind::Enum,
                Rule::identifier => class.name = self.read_name(&child, "type")?,
                Rule::type_parameters => self.read_type_parameters(child)?,
                Rule::extends_clause => extends = self.read_type_list(child)?,
                Rule::implements_clause => {
                    for interface in self.read_type_list(child)? {
                        class.add_interface(interface);
                    }
                }
                Rule::class_body | Rule::enum_body => body = Some(child),
                _ => return Err(self.unexpected(&child)),
            }
        }

        match class.kind {
            ClassKind::Class | ClassKind::Enum => {
                if extends.len() > 1 {
                    return Err(self.error_at(
                        &pair,
                        &format!("class {} cannot extend more than one type", class.name),
                    ));
                }
                class.superclass = extends.pop();
                class.add_interface(TypeRef::named(GROOVY_OBJECT));
            }
            ClassKind::Interface | ClassKind::Annotation => {
                let implemented = std::mem::take(&mut class.interfaces);
                for interface in extends.into_iter().chain(implemented) {
                    class.add_interface(interface);
                }
            }
        }

        if let Some(body) = body {
            self.last_end = body.as_span().start();
            self.read_body(&mut class, body)?;
        }

        self.type_scopes.pop();
        Ok(class)
    }

    fn read_body(&mut self, class: &mut ClassDecl, body: Pair<'i, Rule>) -> Result<()> {
        for member in body.into_inner() {
            let end = member.as_span().end();
            match member.as_rule() {
                Rule::enum_constants => {
                    for constant in member.clone().into_inner() {
                        class.enum_constants.push(self.read_enum_constant(constant)?);
                    }
                }
                Rule::method_def => {
                    let method = self.read_method(member, Some(class.name.as_str()))?;
                    class.methods.push(method);
                }
                Rule::field_def => {
                    let fields = self.read_fields(member)?;
                    class.fields.extend(fields);
                }
                Rule::initializer => {}
                Rule::type_def => {
                    let name = member
                        .clone()
                        .into_inner()
                        .flat_map(|def| def.into_inner())
                        .find(|p| p.as_rule() == Rule::identifier)
                        .map(|p| p.as_str().to_string())
                        .unwrap_or_default();
                    return Err(self.error_at(
                        &member,
                        &format!(
                            "nested type declaration {} in {} is not supported",
                            name, class.name
                        ),
                    ));
                }
                _ => return Err(self.unexpected(&member)),
            }
            self.last_end = end;
        }
        Ok(())
    }

    fn read_enum_constant(&mut self, pair: Pair<'i, Rule>) -> Result<String> {
        if pair.as_rule() != Rule::enum_constant {
            return Err(self.unexpected(&pair));
        }
        let name = pair
            .clone()
            .into_inner()
            .find(|p| p.as_rule() == Rule::identifier)
            .ok_or_else(|| self.error_at(&pair, "enum constant without a name"))?;
        self.read_name(&name, "enum constant")
    }

    // -----------------------------------------------------------------------
    // Members
    // -----------------------------------------------------------------------

    /// Reads a method, constructor or script method.
    ///
    /// A declaration without a return type whose name equals `class_name`
    /// is a constructor.
    fn read_method(&mut self, pair: Pair<'i, Rule>, class_name: Option<&str>) -> Result<MethodDecl> {
        let javadoc = self.javadoc_before(&pair);
        let mut modifiers = ModifierSet::new();
        let mut return_type: Option<TypeRef> = None;
        let mut name = String::new();
        let mut parameters = Vec::new();
        let mut throws = Vec::new();
        let mut body = None;
        self.type_scopes.push(Vec::new());

        for child in pair.clone().into_inner() {
            match child.as_rule() {
                Rule::modifiers => modifiers = self.read_modifiers(child)?,
                Rule::type_parameters => self.read_type_parameters(child)?,
                Rule::return_type => return_type = Some(self.read_return_type(child)?),
                Rule::identifier => name = self.read_name(&child, "method")?,
                Rule::parameters => parameters = self.read_parameters(child)?,
                Rule::throws_clause => throws = self.read_type_list(child)?,
                Rule::default_value => {}
                Rule::method_body => body = Some(child),
                _ => return Err(self.unexpected(&child)),
            }
        }

        let is_constructor = return_type.is_none() && class_name == Some(name.as_str());
        let mut method = if is_constructor {
            let mut ctor = MethodDecl::constructor(&name, modifiers);
            if let Some(body) = body {
                ctor.delegation = self.read_delegation(body, &parameters)?;
            }
            ctor
        } else {
            MethodDecl::method(
                &name,
                return_type.unwrap_or_else(TypeRef::dynamic),
                modifiers,
            )
        };
        method.parameters = parameters;
        method.throws = throws;
        method.javadoc = javadoc;

        self.type_scopes.pop();
        Ok(method)
    }

    fn read_return_type(&mut self, pair: Pair<'i, Rule>) -> Result<TypeRef> {
        let inner = pair
            .clone()
            .into_inner()
            .next()
            .ok_or_else(|| self.error_at(&pair, "empty return type"))?;
        match inner.as_rule() {
            Rule::kw_def => Ok(TypeRef::dynamic()),
            Rule::kw_void => Ok(TypeRef::void()),
            Rule::type_ref => self.read_type_ref(inner),
            _ => Err(self.unexpected(&inner)),
        }
    }

    fn read_parameters(&mut self, pair: Pair<'i, Rule>) -> Result<Vec<ParameterDecl>> {
        let mut parameters = Vec::new();
        for child in pair.into_inner() {
            match child.as_rule() {
                Rule::parameter => parameters.push(self.read_parameter(child)?),
                _ => return Err(self.unexpected(&child)),
            }
        }
        Ok(parameters)
    }

    fn read_parameter(&mut self, pair: Pair<'i, Rule>) -> Result<ParameterDecl> {
        let mut modifiers = ModifierSet::new();
        let mut type_ref = TypeRef::dynamic();
        let mut varargs = false;
        let mut name = String::new();

        for child in pair.into_inner() {
            match child.as_rule() {
                Rule::modifiers => modifiers = self.read_modifiers(child)?,
                Rule::param_type => type_ref = self.read_declared_type(child)?,
                Rule::vararg => varargs = true,
                Rule::identifier => name = self.read_name(&child, "parameter")?,
                Rule::param_default => {}
                _ => return Err(self.unexpected(&child)),
            }
        }

        if varargs {
            type_ref = type_ref.with_extra_dimensions(1);
        }
        Ok(ParameterDecl {
            name,
            type_ref,
            modifiers,
        })
    }

    /// Reads a field declaration; one `FieldDecl` per declarator.
    fn read_fields(&mut self, pair: Pair<'i, Rule>) -> Result<Vec<FieldDecl>> {
        let javadoc = self.javadoc_before(&pair);
        let mut modifiers = ModifierSet::new();
        let mut type_ref = TypeRef::dynamic();
        let mut fields = Vec::new();

        for child in pair.into_inner() {
            match child.as_rule() {
                Rule::modifiers => modifiers = self.read_modifiers(child)?,
                Rule::field_type => type_ref = self.read_declared_type(child)?,
                Rule::variable_declarators => {
                    for declarator in child.into_inner() {
                        let (name, dimensions) = self.read_declarator(declarator)?;
                        let mut field = FieldDecl::new(
                            &name,
                            type_ref.with_extra_dimensions(dimensions),
                            modifiers.clone(),
                        );
                        field.javadoc = javadoc.clone();
                        fields.push(field);
                    }
                }
                _ => return Err(self.unexpected(&child)),
            }
        }
        Ok(fields)
    }

    fn read_declarator(&mut self, pair: Pair<'i, Rule>) -> Result<(String, usize)> {
        if pair.as_rule() != Rule::variable_declarator {
            return Err(self.unexpected(&pair));
        }
        let mut name = String::new();
        let mut dimensions = 0;
        for child in pair.into_inner() {
            match child.as_rule() {
                Rule::identifier => name = self.read_name(&child, "field")?,
                Rule::array_dim => dimensions += 1,
                Rule::expression => {}
                _ => return Err(self.unexpected(&child)),
            }
        }
        Ok((name, dimensions))
    }

    fn read_modifiers(&mut self, pair: Pair<'i, Rule>) -> Result<ModifierSet> {
        let mut modifiers = ModifierSet::new();
        for child in pair.into_inner() {
            match child.as_rule() {
                Rule::annotation => {}
                Rule::modifier => {
                    let modifier =
                        Modifier::from_str(child.as_str()).ok_or_else(|| self.unexpected(&child))?;
                    modifiers.insert(modifier);
                }
                _ => return Err(self.unexpected(&child)),
            }
        }
        Ok(modifiers)
    }

    // -----------------------------------------------------------------------
    // Types
    // -----------------------------------------------------------------------

    /// Reads a `field_type` or `param_type` node: `def` or a type reference.
    fn read_declared_type(&mut self, pair: Pair<'i, Rule>) -> Result<TypeRef> {
        let inner = pair
            .clone()
            .into_inner()
            .next()
            .ok_or_else(|| self.error_at(&pair, "empty type"))?;
        match inner.as_rule() {
            Rule::kw_def => Ok(TypeRef::dynamic()),
            Rule::type_ref => self.read_type_ref(inner),
            _ => Err(self.unexpected(&inner)),
        }
    }

    /// Reads a type reference, dropping type arguments and erasing type
    /// variables to their bound.
    fn read_type_ref(&mut self, pair: Pair<'i, Rule>) -> Result<TypeRef> {
        let mut name = None;
        let mut dimensions = 0;
        for child in pair.clone().into_inner() {
            match child.as_rule() {
                Rule::qualified_name => name = Some(child.as_str()),
                Rule::type_arguments => {}
                Rule::array_dim => dimensions += 1,
                _ => return Err(self.unexpected(&child)),
            }
        }
        let name = name.ok_or_else(|| self.error_at(&pair, "type without a name"))?;
        if let Some(erasure) = self.lookup_type_variable(name) {
            return Ok(erasure.with_extra_dimensions(dimensions));
        }
        Ok(TypeRef::new(name, dimensions))
    }

    fn read_type_list(&mut self, pair: Pair<'i, Rule>) -> Result<Vec<TypeRef>> {
        let mut types = Vec::new();
        for child in pair.into_inner() {
            match child.as_rule() {
                Rule::kw_extends | Rule::kw_implements | Rule::kw_throws => {}
                Rule::type_ref => types.push(self.read_type_ref(child)?),
                _ => return Err(self.unexpected(&child)),
            }
        }
        Ok(types)
    }

    /// Declares type parameters in the innermost scope. Each one is erased
    /// to its first bound, or `java.lang.Object` when unbounded.
    fn read_type_parameters(&mut self, pair: Pair<'i, Rule>) -> Result<()> {
        for parameter in pair.into_inner() {
            if parameter.as_rule() != Rule::type_parameter {
                return Err(self.unexpected(&parameter));
            }
            let mut name = String::new();
            let mut bound = None;
            for child in parameter.into_inner() {
                match child.as_rule() {
                    Rule::identifier => name = child.as_str().to_string(),
                    Rule::kw_extends => {}
                    Rule::type_ref => {
                        let type_ref = self.read_type_ref(child)?;
                        bound.get_or_insert(type_ref);
                    }
                    _ => return Err(self.unexpected(&child)),
                }
            }
            let erasure = bound.unwrap_or_else(|| TypeRef::named(DYNAMIC_TYPE));
            if let Some(scope) = self.type_scopes.last_mut() {
                scope.push((name, erasure));
            }
        }
        Ok(())
    }

    fn lookup_type_variable(&self, name: &str) -> Option<TypeRef> {
        self.type_scopes
            .iter()
            .rev()
            .flat_map(|scope| scope.iter().rev())
            .find(|(var, _)| var == name)
            .map(|(_, erasure)| erasure.clone())
    }

    // -----------------------------------------------------------------------
    // Scripts
    // -----------------------------------------------------------------------

    /// Synthesizes the class a script source compiles to: named after the
    /// file, extending `groovy.lang.Script`, with `main` and `run`.
    fn script_class(&self, file: &SourceFile, methods: Vec<MethodDecl>) -> Result<ClassDecl> {
        let name = Path::new(&self.location)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();
        if !is_java_identifier(&name) {
            return Err(StubError::ModelBuild {
                message: format!("script name '{}' is not a valid class name", name),
                path: self.location.clone(),
                line: None,
            });
        }
        if file.classes.iter().any(|c| c.name == name) {
            return Err(StubError::ModelBuild {
                message: format!("script class {} duplicates a declared class", name),
                path: self.location.clone(),
                line: None,
            });
        }

        let mut class = ClassDecl::new(ClassKind::Class, &name);
        class.superclass = Some(TypeRef::named(GROOVY_SCRIPT));
        class.methods = methods;

        let signatures = class.declared_signatures();
        let mut main = MethodDecl::method(
            "main",
            TypeRef::void(),
            [Modifier::Public, Modifier::Static].into_iter().collect(),
        );
        main.parameters
            .push(ParameterDecl::new("args", TypeRef::new("String", 1)));
        if !signatures.contains(&main.signature()) {
            class.methods.push(main);
        }

        let run = MethodDecl::method(
            "run",
            TypeRef::named(DYNAMIC_TYPE),
            [Modifier::Public].into_iter().collect(),
        );
        if !signatures.contains(&run.signature()) {
            class.methods.push(run);
        }
        Ok(class)
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    /// The text of a declared name, rejected when Java cannot use it.
    fn read_name(&self, pair: &Pair<'i, Rule>, what: &str) -> Result<String> {
        let name = pair.as_str();
        if !is_java_identifier(name) {
            return Err(self.error_at(
                pair,
                &format!("{} name '{}' is not a valid Java identifier", what, name),
            ));
        }
        Ok(name.to_string())
    }

    fn javadoc_before(&self, pair: &Pair<'i, Rule>) -> Option<JavaDoc> {
        let snippet = self.tree.snippet(self.last_end, pair.as_span().start());
        javadoc::extract(snippet)
    }

    fn error_at(&self, pair: &Pair<'i, Rule>, message: &str) -> StubError {
        let (line, _) = pair.line_col();
        StubError::ModelBuild {
            message: message.to_string(),
            path: self.location.clone(),
            line: Some(line),
        }
    }

    fn unexpected(&self, pair: &Pair<'i, Rule>) -> StubError {
        self.error_at(pair, &format!("unexpected {:?} node", pair.as_rule()))
    }
}

/// `true` if `name` can be used as a Java class name.
pub fn is_java_identifier(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "abstract", "assert", "boolean", "break", "byte", "case", "catch", "char", "class",
        "const", "continue", "default", "do", "double", "else", "enum", "extends", "false",
        "final", "finally", "float", "for", "goto", "if", "implements", "import", "instanceof",
        "int", "interface", "long", "native", "new", "null", "package", "private", "protected",
        "public", "return", "short", "static", "strictfp", "super", "switch", "synchronized",
        "this", "throw", "throws", "transient", "true", "try", "void", "volatile", "while",
    ];
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$') && !RESERVED.contains(&name)
}
