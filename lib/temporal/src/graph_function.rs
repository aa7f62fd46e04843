use crate::extent::TemporalExtent;
use crate::function::bind;
use crate::operand::{resolve_variable, Operand};
use crate::record_factory::TemporalRecordFactory;
use crate::relation::TemporalRelation;
use parliament_common::{QueryResult, TripleMatch, TripleSource};
use parliament_engine::PropertyFunction;
use parliament_index::RecordFactory;
use parliament_model::{
    pattern_to_term, Binding, NamedNode, Term, TermPattern, TriplePattern, Variable,
};
use rustc_hash::FxHashSet;
use std::fmt;
use std::sync::Arc;

/// The property function `?x pt:<relation> ?y` answered from the `pt:asInstant` and
/// `pt:asInterval` triples of the queried graph.
///
/// It is used for graphs without a usable temporal index and reads the extents exactly like the
/// index does, so both give the same solutions. A node with more than one extent is related if
/// any of its extents is.
pub struct GraphTemporalFunction {
    relation: TemporalRelation,
    uri: NamedNode,
    records: TemporalRecordFactory,
}

/// Creates a [GraphTemporalFunction] for every temporal relation.
pub fn graph_property_functions() -> Vec<Arc<dyn PropertyFunction>> {
    TemporalRelation::ALL
        .into_iter()
        .map(|relation| {
            let function: Arc<dyn PropertyFunction> =
                Arc::new(GraphTemporalFunction::new(relation));
            function
        })
        .collect()
}

/// An argument of a call with the extents it stands for.
enum Argument {
    Extents(Vec<TemporalExtent>),
    Free(Variable),
}

impl GraphTemporalFunction {
    pub fn new(relation: TemporalRelation) -> Self {
        Self {
            relation,
            uri: relation.uri(),
            records: TemporalRecordFactory::new(),
        }
    }

    pub fn relation(&self) -> TemporalRelation {
        self.relation
    }

    /// The extents of `subject`, or of all nodes if `subject` is [None].
    fn extents(&self, source: &dyn TripleSource, subject: Option<Term>) -> Vec<(Term, TemporalExtent)> {
        let mut extents = Vec::new();
        for predicate in self.records.predicates() {
            let pattern = TripleMatch::new(subject.clone(), Some(predicate.clone()), None);
            extents.extend(
                source
                    .find(&pattern)
                    .filter_map(|triple| self.records.create_record(&triple))
                    .map(|record| (record.key, record.value)),
            );
        }
        extents
    }

    fn argument(
        &self,
        argument: &TermPattern,
        described: &[TriplePattern],
        source: &dyn TripleSource,
    ) -> Argument {
        match argument {
            TermPattern::Variable(variable) => match resolve_variable(variable, described) {
                (Operand::Known(extent), _) => Argument::Extents(vec![extent]),
                _ => Argument::Free(variable.clone()),
            },
            TermPattern::Literal(literal) => {
                Argument::Extents(TemporalExtent::from_literal(literal).into_iter().collect())
            }
            argument => Argument::Extents(
                pattern_to_term(argument)
                    .map(|term| {
                        self.extents(source, Some(term))
                            .into_iter()
                            .map(|(_, extent)| extent)
                            .collect()
                    })
                    .unwrap_or_default(),
            ),
        }
    }

    fn any_related(&self, xs: &[TemporalExtent], ys: &[TemporalExtent]) -> bool {
        xs.iter()
            .any(|x| ys.iter().any(|y| self.relation.test(x, y)))
    }
}

impl fmt::Debug for GraphTemporalFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphTemporalFunction")
            .field("relation", &self.relation)
            .finish_non_exhaustive()
    }
}

impl PropertyFunction for GraphTemporalFunction {
    fn uri(&self) -> &NamedNode {
        &self.uri
    }

    fn operand_predicates(&self) -> &[NamedNode] {
        self.records.predicates()
    }

    fn described(
        &self,
        subject: &TermPattern,
        object: &TermPattern,
        pattern: &[TriplePattern],
    ) -> Vec<TriplePattern> {
        let mut described = Vec::new();
        for argument in [subject, object] {
            let TermPattern::Variable(variable) = argument else {
                continue;
            };
            if let (_, Some(triple)) = resolve_variable(variable, pattern) {
                if !described.contains(&triple) {
                    described.push(triple);
                }
            }
        }
        described
    }

    fn execute(
        &self,
        subject: &TermPattern,
        object: &TermPattern,
        described: &[TriplePattern],
        binding: &Binding,
        source: &dyn TripleSource,
    ) -> QueryResult<Vec<Binding>> {
        let first = self.argument(subject, described, source);
        let second = self.argument(object, described, source);
        let mut solutions = Vec::new();
        match (first, second) {
            (Argument::Extents(xs), Argument::Extents(ys)) => {
                if self.any_related(&xs, &ys) {
                    solutions.push(binding.clone());
                }
            }
            (Argument::Free(variable), Argument::Extents(ys)) => {
                for (node, x) in self.extents(source, None) {
                    if self.any_related(&[x], &ys) {
                        solutions.extend(bind(binding, &variable, node));
                    }
                }
            }
            (Argument::Extents(xs), Argument::Free(variable)) => {
                for (node, y) in self.extents(source, None) {
                    if self.any_related(&xs, &[y]) {
                        solutions.extend(bind(binding, &variable, node));
                    }
                }
            }
            (Argument::Free(first), Argument::Free(second)) => {
                let extents = self.extents(source, None);
                for (x_node, x) in &extents {
                    for (y_node, y) in &extents {
                        if !self.relation.test(x, y) {
                            continue;
                        }
                        let solution = bind(binding, &first, x_node.clone())
                            .and_then(|partial| bind(&partial, &second, y_node.clone()));
                        solutions.extend(solution);
                    }
                }
            }
        }
        let mut seen = FxHashSet::default();
        solutions.retain(|solution| seen.insert(solution.clone()));
        Ok(solutions)
    }
}
