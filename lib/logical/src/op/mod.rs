mod convert;
mod display;
mod expression;
mod tree;
mod variables;

pub use expression::{expression_variables, is_constant, ExpressionDisplay};
pub(crate) use expression::{conjuncts, disjuncts, substitute_expression};

use parliament_model::{
    BasicPattern, Binding, Expression, NamedNode, NamedNodePattern, OrderExpression,
    PropertyPathExpression, TermPattern, Variable,
};

/// The algebra evaluated by the Parliament query engine.
///
/// The algebra mirrors the SPARQL algebra of
/// [spargebra](https://docs.rs/spargebra/latest/spargebra/algebra/enum.GraphPattern.html) and adds
/// the operators introduced by the rewrite pipeline:
/// - [Op::Sequence] and [Op::Conditional] are joins that feed the solutions of one side into the
///   other side.
/// - [Op::PropFunc] calls a property function.
/// - [Op::IndexPropFunc] calls a property function that is answered by a secondary index.
///
/// Blank nodes of the query are replaced by anonymous variables
/// (see [anonymous_variable](parliament_model::anonymous_variable)).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    /// A basic graph pattern.
    Bgp(BasicPattern),
    /// A property path between two terms.
    Path {
        subject: TermPattern,
        path: PropertyPathExpression,
        object: TermPattern,
    },
    /// An inline table of solutions. [Op::unit] is the table with a single empty solution.
    Table {
        variables: Vec<Variable>,
        rows: Vec<Binding>,
    },
    /// Joins two independently evaluated operators.
    Join { left: Box<Op>, right: Box<Op> },
    /// Evaluates each element with the solutions of the previous element as input.
    Sequence(Vec<Op>),
    /// An optional join.
    LeftJoin {
        left: Box<Op>,
        right: Box<Op>,
        expression: Option<Expression>,
    },
    /// An optional join that evaluates the right side once per solution of the left side.
    Conditional { left: Box<Op>, right: Box<Op> },
    /// Keeps the solutions for which all expressions are true.
    Filter {
        expressions: Vec<Expression>,
        inner: Box<Op>,
    },
    Union { left: Box<Op>, right: Box<Op> },
    Minus { left: Box<Op>, right: Box<Op> },
    /// Evaluates `inner` against a named graph.
    Graph {
        name: NamedNodePattern,
        inner: Box<Op>,
    },
    /// Binds `variable` to the value of `expression`.
    Extend {
        inner: Box<Op>,
        variable: Variable,
        expression: Expression,
    },
    /// A call `subject <uri> object` of a property function. `inner` provides the input.
    ///
    /// `pattern` holds the triples that give the value of an argument within the query, e.g.,
    /// `_:b pt:asInterval "..."`. The function decides which of them it reads itself.
    PropFunc {
        uri: NamedNode,
        subject: TermPattern,
        object: TermPattern,
        pattern: BasicPattern,
        inner: Box<Op>,
    },
    /// A call of a property function that is answered by an index.
    ///
    /// `pattern` holds the triples describing the arguments of the call. Without the index, the
    /// call is evaluated as its [effective form](Op::effective).
    IndexPropFunc {
        uri: NamedNode,
        subject: TermPattern,
        object: TermPattern,
        pattern: BasicPattern,
        inner: Box<Op>,
    },
    OrderBy {
        inner: Box<Op>,
        expressions: Vec<OrderExpression>,
    },
    Project {
        inner: Box<Op>,
        variables: Vec<Variable>,
    },
    Distinct { inner: Box<Op> },
    Reduced { inner: Box<Op> },
    Slice {
        inner: Box<Op>,
        start: usize,
        length: Option<usize>,
    },
}

impl Op {
    /// The table with a single empty solution.
    pub fn unit() -> Self {
        Self::Table {
            variables: Vec::new(),
            rows: vec![Binding::new()],
        }
    }

    pub fn is_unit(&self) -> bool {
        matches!(self, Self::Table { variables, rows } if variables.is_empty() && rows.len() == 1)
    }

    pub fn bgp(pattern: impl Into<BasicPattern>) -> Self {
        Self::Bgp(pattern.into())
    }

    pub fn join(left: Op, right: Op) -> Self {
        Self::Join {
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Creates a sequence of `first` and `second`. Nested sequences are flattened and units are
    /// dropped.
    pub fn sequence(first: Op, second: Op) -> Self {
        let mut elements = Vec::new();
        for op in [first, second] {
            match op {
                Self::Sequence(inner) => elements.extend(inner),
                op if op.is_unit() => {}
                op => elements.push(op),
            }
        }
        match elements.len() {
            0 => Self::unit(),
            1 => elements.pop().unwrap_or_else(Self::unit),
            _ => Self::Sequence(elements),
        }
    }

    /// Filters `inner` with `expressions`. A filter directly below is extended instead of nesting
    /// another filter.
    pub fn filter(expressions: Vec<Expression>, inner: Op) -> Self {
        if expressions.is_empty() {
            return inner;
        }
        match inner {
            Self::Filter {
                expressions: mut existing,
                inner,
            } => {
                existing.extend(expressions);
                Self::Filter {
                    expressions: existing,
                    inner,
                }
            }
            inner => Self::Filter {
                expressions,
                inner: Box::new(inner),
            },
        }
    }

    pub fn union(left: Op, right: Op) -> Self {
        Self::Union {
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn extend(inner: Op, variable: Variable, expression: Expression) -> Self {
        Self::Extend {
            inner: Box::new(inner),
            variable,
            expression,
        }
    }

    /// Returns the operator that computes the same solutions as this one without any index.
    ///
    /// An [Op::IndexPropFunc] falls back to a plain property function call with the same argument
    /// pattern and input. All other operators are returned as is.
    pub fn effective(&self) -> Op {
        match self {
            Self::IndexPropFunc {
                uri,
                subject,
                object,
                pattern,
                inner,
            } => Self::PropFunc {
                uri: uri.clone(),
                subject: subject.clone(),
                object: object.clone(),
                pattern: pattern.clone(),
                inner: inner.clone(),
            },
            op => op.clone(),
        }
    }
}
