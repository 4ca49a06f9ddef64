/// Renders the source model as Java stub text.
///
/// One `render` call produces the complete compilation unit of one top-level
/// class. The parsed model is never modified: effective modifiers and all
/// synthesized members are computed on the fly.
pub mod members;

use tracing::debug;

use crate::builder::is_java_identifier;
use crate::errors::{Result, StubError};
use crate::types::*;
use members::{protocol_methods, property_members, MagicConstructors};

/// The single statement of every stub body.
pub const STUB_BODY: &str = "throw new InternalError(\"Stubbed method\");";

/// Names Groovy resolves without an import.
pub const DEFAULT_IMPORTS: &[&str] = &[
    "java.lang.*",
    "java.io.*",
    "java.net.*",
    "java.util.*",
    "groovy.lang.*",
    "groovy.util.*",
    "java.math.BigInteger",
    "java.math.BigDecimal",
];

const INDENT: &str = "    ";

/// Options that change the rendered text.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Emit `DEFAULT_IMPORTS` after the declared imports.
    pub default_imports: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            default_imports: true,
        }
    }
}

/// One rendered compilation unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedStub {
    pub class_name: String,
    pub text: String,
}

/// Renders the classes of one source file.
pub struct StubRenderer<'a> {
    file: &'a SourceFile,
    options: RenderOptions,
}

impl<'a> StubRenderer<'a> {
    pub fn new(file: &'a SourceFile, options: RenderOptions) -> Self {
        Self { file, options }
    }

    /// Renders every top-level class of the file, in declaration order.
    pub fn render_all(&self) -> Result<Vec<RenderedStub>> {
        self.file
            .classes
            .iter()
            .map(|class| {
                Ok(RenderedStub {
                    class_name: class.name.clone(),
                    text: self.render(class)?,
                })
            })
            .collect()
    }

    /// Renders one class as a complete Java compilation unit.
    ///
    /// Fails only when the model breaks an invariant the builder guarantees,
    /// such as a class that does not belong to this file.
    pub fn render(&self, class: &ClassDecl) -> Result<String> {
        self.check_invariants(class)?;

        let declared = class.declared_signatures();
        let mut out = Output::default();

        self.write_banner(&mut out);
        self.write_package(&mut out);
        self.write_imports(&mut out);
        self.write_header(&mut out, class);

        let magic = MagicConstructors::plan(class);
        if class.kind == ClassKind::Enum {
            let arguments = magic
                .enum_constant_arguments(class)
                .map(|args| format!("({})", self.call_arguments(&args)))
                .unwrap_or_default();
            let constants: Vec<String> = class
                .enum_constants
                .iter()
                .map(|constant| format!("{}{}", constant, arguments))
                .collect();
            out.line(1, &format!("{};", constants.join(", ")));
            out.blank();
        }

        for field in &class.fields {
            if class.is_property(field) {
                let property = property_members(field, &declared);
                self.write_field(&mut out, &property.field);
                for method in property.methods() {
                    self.write_method(&mut out, class, method, None);
                }
            } else {
                self.write_field(&mut out, field);
            }
        }

        for ctor in magic.iter() {
            self.write_method(&mut out, class, ctor, None);
        }

        for method in &class.methods {
            let delegation = if method.is_constructor() {
                magic.delegation_for(method)
            } else {
                None
            };
            self.write_method(&mut out, class, method, delegation.as_ref());
        }

        for method in protocol_methods(class, &declared) {
            self.write_method(&mut out, class, &method, None);
        }

        out.text.push_str("}\n");
        debug!(class = %class.name, source = %self.file.location, "rendered stub");
        Ok(out.text)
    }

    fn check_invariants(&self, class: &ClassDecl) -> Result<()> {
        let violation = |message: String| StubError::Render {
            message,
            class: class.name.clone(),
        };
        if !self.file.classes.iter().any(|c| std::ptr::eq(c, class)) {
            return Err(violation(format!(
                "class does not belong to {}",
                self.file.location
            )));
        }
        if !is_java_identifier(&class.name) {
            return Err(violation("class name is not a Java identifier".to_string()));
        }
        if let Some(field) = class.fields.iter().find(|f| !is_java_identifier(&f.name)) {
            return Err(violation(format!("invalid field name '{}'", field.name)));
        }
        if let Some(method) = class.methods.iter().find(|m| !is_java_identifier(&m.name)) {
            return Err(violation(format!("invalid method name '{}'", method.name)));
        }
        if class.kind != ClassKind::Enum && !class.enum_constants.is_empty() {
            return Err(violation("enum constants outside an enum".to_string()));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // File prologue
    // -----------------------------------------------------------------------

    fn write_banner(&self, out: &mut Output) {
        out.line(0, &format!("// Stub generated from {}", self.file.location));
        out.line(0, "// Do not edit: regenerated on every build.");
        out.blank();
    }

    fn write_package(&self, out: &mut Output) {
        match &self.file.package {
            Some(package) => out.line(0, &format!("package {};", package)),
            None => out.line(0, "// (default package)"),
        }
        out.blank();
    }

    fn write_imports(&self, out: &mut Output) {
        let mut any = false;
        for import in &self.file.imports {
            any = true;
            if let Some(alias) = &import.alias {
                out.line(
                    0,
                    &format!(
                        "// import {} as {}: '{}' is rendered as {}",
                        import.qualified_name(),
                        alias,
                        alias,
                        import.qualified_name()
                    ),
                );
                continue;
            }
            let keyword = if import.is_static { "import static" } else { "import" };
            let wildcard = if import.wildcard { ".*" } else { "" };
            out.line(
                0,
                &format!("{} {}{};", keyword, import.qualified_name(), wildcard),
            );
        }
        if self.options.default_imports {
            for name in DEFAULT_IMPORTS {
                any = true;
                out.line(0, &format!("import {};", name));
            }
        }
        if any {
            out.blank();
        }
    }

    // -----------------------------------------------------------------------
    // Declarations
    // -----------------------------------------------------------------------

    fn write_header(&self, out: &mut Output, class: &ClassDecl) {
        write_javadoc(out, 0, class.javadoc.as_ref());

        let mut modifiers = class.modifiers.with_default_access(Modifier::Public);
        if class.kind == ClassKind::Enum {
            modifiers = modifiers.without(&[Modifier::Abstract, Modifier::Final]);
        }
        out.line(
            0,
            &format!("{} {} {}", modifiers, class.kind.keyword(), class.name),
        );

        if class.kind.is_interface_like() {
            if !class.interfaces.is_empty() {
                out.line(1, &format!("extends {}", self.type_list(&class.interfaces)));
            }
        } else {
            if let Some(superclass) = &class.superclass {
                if class.kind != ClassKind::Enum {
                    out.line(1, &format!("extends {}", self.type_name(superclass)));
                }
            }
            if !class.interfaces.is_empty() {
                out.line(
                    1,
                    &format!("implements {}", self.type_list(&class.interfaces)),
                );
            }
        }
        out.line(0, "{");
    }

    fn write_field(&self, out: &mut Output, field: &FieldDecl) {
        write_javadoc(out, 1, field.javadoc.as_ref());
        out.line(
            1,
            &format!(
                "{}{} {} = {};",
                prefixed(&field.modifiers),
                self.type_name(&field.type_ref),
                field.name,
                field.type_ref.default_value()
            ),
        );
        out.blank();
    }

    /// Writes a method or constructor.
    ///
    /// `this_call` is the delegation a declared constructor makes to its
    /// magic counterpart; magic constructors carry their own super call.
    fn write_method(
        &self,
        out: &mut Output,
        class: &ClassDecl,
        method: &MethodDecl,
        this_call: Option<&Delegation>,
    ) {
        write_javadoc(out, 1, method.javadoc.as_ref());

        let modifiers = effective_modifiers(class, method);
        let return_type = match &method.return_type {
            Some(t) if !method.is_constructor() => format!("{} ", self.type_name(t)),
            _ => String::new(),
        };
        let parameters: Vec<String> = method
            .parameters
            .iter()
            .map(|p| {
                format!(
                    "{}{} {}",
                    prefixed(&p.modifiers),
                    self.type_name(&p.type_ref),
                    p.name
                )
            })
            .collect();
        let throws = if method.throws.is_empty() {
            String::new()
        } else {
            format!(" throws {}", self.type_list(&method.throws))
        };
        let signature = format!(
            "{}{}{}({}){}",
            prefixed(&modifiers),
            return_type,
            method.name,
            parameters.join(", "),
            throws
        );

        if !has_body(class, &modifiers) {
            out.line(1, &format!("{};", signature));
            out.blank();
            return;
        }

        out.line(1, &format!("{} {{", signature));
        let delegation = if method.magic {
            method.delegation.as_ref()
        } else {
            this_call
        };
        if let Some(delegation) = delegation {
            out.line(2, &self.delegation_call(delegation));
        }
        out.line(2, STUB_BODY);
        out.line(1, "}");
        out.blank();
    }

    /// `super((int)0, (java.lang.String)null);` and friends. Untyped
    /// arguments render as a bare `null`.
    fn delegation_call(&self, delegation: &Delegation) -> String {
        format!(
            "{}({});",
            delegation.target.as_str(),
            self.call_arguments(&delegation.args)
        )
    }

    fn call_arguments(&self, args: &[DelegationArg]) -> String {
        args.iter()
            .map(|arg| match &arg.type_ref {
                Some(t) => format!("({}){}", self.type_name(t), t.default_value()),
                None => "null".to_string(),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    // -----------------------------------------------------------------------
    // Types
    // -----------------------------------------------------------------------

    /// The rendered form of a type: import aliases are replaced by the
    /// name they stand for, untyped references become `java.lang.Object`.
    fn type_name(&self, type_ref: &TypeRef) -> String {
        let name = type_ref.name();
        let resolved = match self.file.import_for_alias(name) {
            Some(import) if !import.is_static => import.qualified_name(),
            _ => name.to_string(),
        };
        format!("{}{}", resolved, "[]".repeat(type_ref.dimensions))
    }

    fn type_list(&self, types: &[TypeRef]) -> String {
        types
            .iter()
            .map(|t| self.type_name(t))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Modifiers a member is rendered with.
///
/// Members without an access modifier become `public`, except enum
/// constructors, which Java requires to be private or package-private.
pub fn effective_modifiers(class: &ClassDecl, method: &MethodDecl) -> ModifierSet {
    if class.kind == ClassKind::Enum && method.is_constructor() {
        return method
            .modifiers
            .without(&[Modifier::Public, Modifier::Protected]);
    }
    method.modifiers.with_default_access(Modifier::Public)
}

/// Interface and annotation members, abstract and native methods end in `;`.
fn has_body(class: &ClassDecl, modifiers: &ModifierSet) -> bool {
    !(class.kind.is_interface_like()
        || modifiers.contains(Modifier::Abstract)
        || modifiers.contains(Modifier::Native))
}

/// `"public static "` for a non-empty set, `""` otherwise.
fn prefixed(modifiers: &ModifierSet) -> String {
    if modifiers.is_empty() {
        String::new()
    } else {
        format!("{} ", modifiers)
    }
}

fn write_javadoc(out: &mut Output, level: usize, doc: Option<&JavaDoc>) {
    let doc = match doc {
        Some(doc) if !doc.is_empty() => doc,
        _ => return,
    };
    out.line(level, "/**");
    for line in doc.comment.lines() {
        out.line(level, format!(" * {}", line).trim_end());
    }
    if !doc.comment.is_empty() && !doc.tags.is_empty() {
        out.line(level, " *");
    }
    for tag in &doc.tags {
        let mut lines = tag.value.lines();
        let first = lines.next().unwrap_or("");
        out.line(level, format!(" * @{} {}", tag.name, first).trim_end());
        for rest in lines {
            out.line(level, &format!(" *     {}", rest));
        }
    }
    out.line(level, " */");
}

/// Line-oriented text buffer.
#[derive(Default)]
struct Output {
    text: String,
}

impl Output {
    fn line(&mut self, level: usize, content: &str) {
        for _ in 0..level {
            self.text.push_str(INDENT);
        }
        self.text.push_str(content);
        self.text.push('\n');
    }

    fn blank(&mut self) {
        self.text.push('\n');
    }
}
