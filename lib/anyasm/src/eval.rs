use std::collections::{HashMap, HashSet};

use crate::encoding::SizeRange;
use crate::expression::Expression;

/// A named function over expressions. Calling one substitutes the given
/// arguments for the parameters without evaluating them first, so the
/// returned expression keeps resolving inside the caller's environment.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub parameters: Vec<String>,
    pub body: Expression,
}

impl Function {
    pub fn new(parameters: Vec<String>, body: Expression) -> Self {
        Self { parameters, body }
    }

    pub fn call(&self, arguments: &[Expression]) -> Result<Expression, String> {
        if arguments.len() != self.parameters.len() {
            return Err(String::from("invalid number of arguments"));
        }

        // Parameters are bound in an otherwise empty environment: anything
        // the body mentions beyond them stays unresolved for the caller to
        // pick up later.
        let mut environment = Environment::new();
        for (parameter, argument) in self.parameters.iter().zip(arguments) {
            environment.define_variable(parameter.clone(), argument.clone());
        }
        let context = EvaluationContext::new(&environment).shallow();
        match self.body.evaluate(&context)? {
            Some(expression) => Ok(expression),
            None => Ok(self.body.clone()),
        }
    }
}

/// The symbol tables an expression can resolve against: variables bound to
/// expressions, functions, label offsets and object base addresses. An
/// environment can be chained below another one, in which case lookups
/// fall through to the parent whenever the local tables miss.
#[derive(Debug, Default)]
pub struct Environment<'a> {
    variables: HashMap<String, Expression>,
    functions: HashMap<String, Function>,
    labels: HashMap<String, SizeRange>,
    objects: HashMap<String, u64>,
    next: Option<&'a Environment<'a>>,
}

impl<'a> Environment<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parent(parent: &'a Environment<'a>) -> Self {
        Self {
            next: Some(parent),
            ..Self::default()
        }
    }

    pub fn define_variable(&mut self, name: impl Into<String>, expression: Expression) {
        self.variables.insert(name.into(), expression);
    }

    pub fn define_function(&mut self, name: impl Into<String>, function: Function) {
        self.functions.insert(name.into(), function);
    }

    pub fn define_label(&mut self, name: impl Into<String>, offset: SizeRange) {
        self.labels.insert(name.into(), offset);
    }

    pub fn define_object(&mut self, name: impl Into<String>, address: u64) {
        self.objects.insert(name.into(), address);
    }

    pub fn get_variable(&self, name: &str) -> Option<&Expression> {
        self.variables
            .get(name)
            .or_else(|| self.next.and_then(|parent| parent.get_variable(name)))
    }

    pub fn get_function(&self, name: &str) -> Option<&Function> {
        self.functions
            .get(name)
            .or_else(|| self.next.and_then(|parent| parent.get_function(name)))
    }

    pub fn get_label(&self, name: &str) -> Option<SizeRange> {
        self.labels
            .get(name)
            .copied()
            .or_else(|| self.next.and_then(|parent| parent.get_label(name)))
    }

    pub fn get_object(&self, name: &str) -> Option<u64> {
        self.objects
            .get(name)
            .copied()
            .or_else(|| self.next.and_then(|parent| parent.get_object(name)))
    }
}

/// Everything `Expression::evaluate` needs to know besides the tree itself:
/// the environment to resolve against, whether resolution should stop at
/// variable substitution (`shallow`), which object currently owns the
/// output position, and the set of variables being resolved right now so
/// circular definitions are caught instead of looping.
#[derive(Debug, Clone)]
pub struct EvaluationContext<'a> {
    pub environment: &'a Environment<'a>,
    pub shallow: bool,
    pub object: Option<String>,
    evaluating: HashSet<String>,
}

impl<'a> EvaluationContext<'a> {
    pub fn new(environment: &'a Environment<'a>) -> Self {
        Self {
            environment,
            shallow: false,
            object: None,
            evaluating: HashSet::new(),
        }
    }

    /// Substitute variables but don't chase what they are bound to. Used
    /// when binding function parameters, so arguments are passed along as
    /// written.
    pub fn shallow(mut self) -> Self {
        self.shallow = true;
        self
    }

    pub fn with_object(mut self, name: impl Into<String>) -> Self {
        self.object = Some(name.into());
        self
    }

    pub fn evaluating_variable(&self, name: &str) -> Self {
        let mut context = self.clone();
        context.evaluating.insert(name.to_string());
        context
    }

    pub fn is_evaluating(&self, name: &str) -> bool {
        self.evaluating.contains(name)
    }
}
