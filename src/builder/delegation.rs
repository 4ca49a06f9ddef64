/// Leading `super(...)`/`this(...)` calls of constructor bodies.
///
/// Each argument gets a best-effort static type, tried in this order:
/// explicit cast, `as` cast, `new Type(...)`, literal kind, a constructor
/// parameter with the same name. Anything else stays untyped.
use pest::iterators::Pair;

use super::ModelBuilder;
use crate::errors::Result;
use crate::parser::Rule;
use crate::types::{Delegation, DelegationArg, DelegationTarget, ParameterDecl, TypeRef};

/// The static type of a literal node, `None` for non-literal rules.
pub fn literal_type(rule: Rule) -> Option<TypeRef> {
    let name = match rule {
        Rule::boolean_lit => "boolean",
        Rule::string_lit => "String",
        Rule::int_lit => "int",
        Rule::long_lit => "long",
        Rule::float_lit => "float",
        Rule::double_lit => "double",
        Rule::big_integer_lit => "java.math.BigInteger",
        Rule::big_decimal_lit => "java.math.BigDecimal",
        _ => return None,
    };
    Some(TypeRef::named(name))
}

impl<'t, 'i> ModelBuilder<'t, 'i> {
    /// Reads the delegation call of a constructor body, if it starts with one.
    pub(super) fn read_delegation(
        &mut self,
        body: Pair<'i, Rule>,
        parameters: &[ParameterDecl],
    ) -> Result<Option<Delegation>> {
        let call = match body
            .into_inner()
            .find(|p| p.as_rule() == Rule::delegation_call)
        {
            Some(call) => call,
            None => return Ok(None),
        };

        let mut target = DelegationTarget::Super;
        let mut args = Vec::new();
        for child in call.into_inner() {
            match child.as_rule() {
                Rule::delegation_target => {
                    target = if child.as_str() == "this" {
                        DelegationTarget::This
                    } else {
                        DelegationTarget::Super
                    };
                }
                Rule::call_arguments => {
                    for arg in child.into_inner() {
                        args.push(self.read_call_arg(arg, parameters)?);
                    }
                }
                _ => return Err(self.unexpected(&child)),
            }
        }
        Ok(Some(Delegation { target, args }))
    }

    fn read_call_arg(
        &mut self,
        pair: Pair<'i, Rule>,
        parameters: &[ParameterDecl],
    ) -> Result<DelegationArg> {
        let text = pair.as_str().trim().to_string();
        let inner = match pair.clone().into_inner().next() {
            Some(inner) => inner,
            None => return Err(self.unexpected(&pair)),
        };

        let type_ref = match inner.as_rule() {
            Rule::as_arg => Some(self.as_arg_type(inner)?),
            Rule::cast_arg | Rule::new_arg => Some(self.first_type_ref(inner)?),
            Rule::literal_arg => inner
                .clone()
                .into_inner()
                .next()
                .and_then(|lit| literal_type(lit.as_rule())),
            Rule::name_arg => parameters
                .iter()
                .find(|p| p.name == inner.as_str())
                .map(|p| p.type_ref.clone()),
            Rule::raw_arg => None,
            _ => return Err(self.unexpected(&inner)),
        };
        Ok(DelegationArg { text, type_ref })
    }

    /// `(A) x as B` is typed `A`; `x as B` is typed `B`.
    fn as_arg_type(&mut self, pair: Pair<'i, Rule>) -> Result<TypeRef> {
        let children: Vec<Pair<'i, Rule>> = pair.clone().into_inner().collect();
        let chosen = match children.first() {
            Some(first) if first.as_rule() == Rule::type_ref => Some(first.clone()),
            _ => children
                .iter()
                .rev()
                .find(|p| p.as_rule() == Rule::type_ref)
                .cloned(),
        };
        match chosen {
            Some(type_ref) => self.read_type_ref(type_ref),
            None => Err(self.unexpected(&pair)),
        }
    }

    fn first_type_ref(&mut self, pair: Pair<'i, Rule>) -> Result<TypeRef> {
        match pair
            .clone()
            .into_inner()
            .find(|p| p.as_rule() == Rule::type_ref)
        {
            Some(type_ref) => self.read_type_ref(type_ref),
            None => Err(self.unexpected(&pair)),
        }
    }
}
