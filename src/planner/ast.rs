//! Query AST
//!
//! Predicates, sort orders and the query envelope handed to the planner.
//! Properties are carried as [`PropertyDescriptor`]s, so every node is
//! bound to a typed accessor rather than a field name.

use std::fmt;

use crate::index::{IndexKey, PropertyDescriptor};

/// Comparison applied to one property
#[derive(Debug, Clone, PartialEq)]
pub enum FilterOp {
    /// property = value
    Eq(IndexKey),
    /// property != value
    Neq(IndexKey),
    /// property > value
    Gt(IndexKey),
    /// property >= value
    Gte(IndexKey),
    /// property < value
    Lt(IndexKey),
    /// property <= value
    Lte(IndexKey),
    /// property equals one of the values
    In(Vec<IndexKey>),
}

impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterOp::Eq(v) => write!(f, "= {}", v),
            FilterOp::Neq(v) => write!(f, "!= {}", v),
            FilterOp::Gt(v) => write!(f, "> {}", v),
            FilterOp::Gte(v) => write!(f, ">= {}", v),
            FilterOp::Lt(v) => write!(f, "< {}", v),
            FilterOp::Lte(v) => write!(f, "<= {}", v),
            FilterOp::In(values) => {
                let parts: Vec<String> = values.iter().map(ToString::to_string).collect();
                write!(f, "in ({})", parts.join(", "))
            }
        }
    }
}

/// Boolean predicate tree over record properties.
pub enum Predicate<R> {
    /// Matches everything
    True,
    /// Matches nothing
    False,
    /// Single property comparison
    Compare {
        property: PropertyDescriptor<R>,
        op: FilterOp,
    },
    /// All terms match
    And(Vec<Predicate<R>>),
    /// At least one term matches
    Or(Vec<Predicate<R>>),
    /// Negation
    Not(Box<Predicate<R>>),
}

impl<R> Predicate<R> {
    fn compare(property: PropertyDescriptor<R>, op: FilterOp) -> Self {
        Predicate::Compare { property, op }
    }

    /// property = value
    pub fn eq(property: PropertyDescriptor<R>, value: impl Into<IndexKey>) -> Self {
        Self::compare(property, FilterOp::Eq(value.into()))
    }

    /// property != value
    pub fn neq(property: PropertyDescriptor<R>, value: impl Into<IndexKey>) -> Self {
        Self::compare(property, FilterOp::Neq(value.into()))
    }

    /// property > value
    pub fn gt(property: PropertyDescriptor<R>, value: impl Into<IndexKey>) -> Self {
        Self::compare(property, FilterOp::Gt(value.into()))
    }

    /// property >= value
    pub fn gte(property: PropertyDescriptor<R>, value: impl Into<IndexKey>) -> Self {
        Self::compare(property, FilterOp::Gte(value.into()))
    }

    /// property < value
    pub fn lt(property: PropertyDescriptor<R>, value: impl Into<IndexKey>) -> Self {
        Self::compare(property, FilterOp::Lt(value.into()))
    }

    /// property <= value
    pub fn lte(property: PropertyDescriptor<R>, value: impl Into<IndexKey>) -> Self {
        Self::compare(property, FilterOp::Lte(value.into()))
    }

    /// property equals any of `values`
    pub fn in_list<V: Into<IndexKey>>(
        property: PropertyDescriptor<R>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Self::compare(property, FilterOp::In(values.into_iter().map(Into::into).collect()))
    }

    /// Conjunction
    pub fn and(terms: impl IntoIterator<Item = Predicate<R>>) -> Self {
        Predicate::And(terms.into_iter().collect())
    }

    /// Disjunction
    pub fn or(terms: impl IntoIterator<Item = Predicate<R>>) -> Self {
        Predicate::Or(terms.into_iter().collect())
    }

    /// Negation
    pub fn negate(term: Predicate<R>) -> Self {
        Predicate::Not(Box::new(term))
    }

    /// Terms that must all hold, flattening nested conjunctions.
    ///
    /// `True` contributes no terms.
    pub fn conjuncts(&self) -> Vec<&Predicate<R>> {
        let mut out = Vec::new();
        self.push_conjuncts(&mut out);
        out
    }

    fn push_conjuncts<'a>(&'a self, out: &mut Vec<&'a Predicate<R>>) {
        match self {
            Predicate::True => {}
            Predicate::And(terms) => {
                for term in terms {
                    term.push_conjuncts(out);
                }
            }
            other => out.push(other),
        }
    }
}

impl<R> Clone for Predicate<R> {
    fn clone(&self) -> Self {
        match self {
            Predicate::True => Predicate::True,
            Predicate::False => Predicate::False,
            Predicate::Compare { property, op } => Predicate::Compare {
                property: property.clone(),
                op: op.clone(),
            },
            Predicate::And(terms) => Predicate::And(terms.clone()),
            Predicate::Or(terms) => Predicate::Or(terms.clone()),
            Predicate::Not(inner) => Predicate::Not(inner.clone()),
        }
    }
}

impl<R> PartialEq for Predicate<R> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Predicate::True, Predicate::True) | (Predicate::False, Predicate::False) => true,
            (
                Predicate::Compare { property: p1, op: o1 },
                Predicate::Compare { property: p2, op: o2 },
            ) => p1.same_property(p2) && o1 == o2,
            (Predicate::And(a), Predicate::And(b)) | (Predicate::Or(a), Predicate::Or(b)) => a == b,
            (Predicate::Not(a), Predicate::Not(b)) => a == b,
            _ => false,
        }
    }
}

impl<R> fmt::Display for Predicate<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join<R>(f: &mut fmt::Formatter<'_>, terms: &[Predicate<R>], sep: &str) -> fmt::Result {
            write!(f, "(")?;
            for (i, term) in terms.iter().enumerate() {
                if i > 0 {
                    write!(f, " {} ", sep)?;
                }
                write!(f, "{}", term)?;
            }
            write!(f, ")")
        }

        match self {
            Predicate::True => write!(f, "TRUE"),
            Predicate::False => write!(f, "FALSE"),
            Predicate::Compare { property, op } => write!(f, "{} {}", property, op),
            Predicate::And(terms) => join(f, terms, "AND"),
            Predicate::Or(terms) => join(f, terms, "OR"),
            Predicate::Not(inner) => write!(f, "NOT {}", inner),
        }
    }
}

impl<R> fmt::Debug for Predicate<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Predicate({})", self)
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// One sort key
pub struct SortSpec<R> {
    /// Property to sort by
    pub property: PropertyDescriptor<R>,
    /// Sort direction
    pub direction: SortDirection,
}

impl<R> SortSpec<R> {
    pub fn asc(property: PropertyDescriptor<R>) -> Self {
        Self {
            property,
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(property: PropertyDescriptor<R>) -> Self {
        Self {
            property,
            direction: SortDirection::Desc,
        }
    }
}

impl<R> Clone for SortSpec<R> {
    fn clone(&self) -> Self {
        Self {
            property: self.property.clone(),
            direction: self.direction,
        }
    }
}

impl<R> fmt::Display for SortSpec<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.property, self.direction.as_str())
    }
}

impl<R> fmt::Debug for SortSpec<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SortSpec({})", self)
    }
}

/// Multi-key sort order; earlier keys take precedence.
pub struct Order<R> {
    pub keys: Vec<SortSpec<R>>,
}

impl<R> Order<R> {
    /// Ascending on one property
    pub fn asc(property: PropertyDescriptor<R>) -> Self {
        Self {
            keys: vec![SortSpec::asc(property)],
        }
    }

    /// Descending on one property
    pub fn desc(property: PropertyDescriptor<R>) -> Self {
        Self {
            keys: vec![SortSpec::desc(property)],
        }
    }

    /// Adds an ascending tie-breaker
    pub fn then_asc(mut self, property: PropertyDescriptor<R>) -> Self {
        self.keys.push(SortSpec::asc(property));
        self
    }

    /// Adds a descending tie-breaker
    pub fn then_desc(mut self, property: PropertyDescriptor<R>) -> Self {
        self.keys.push(SortSpec::desc(property));
        self
    }
}

impl<R> Clone for Order<R> {
    fn clone(&self) -> Self {
        Self {
            keys: self.keys.clone(),
        }
    }
}

impl<R> fmt::Display for Order<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.keys.iter().map(ToString::to_string).collect();
        f.write_str(&parts.join(", "))
    }
}

/// Select / removeAll parameters
pub struct Query<R> {
    /// Filter; `None` matches every record
    pub predicate: Option<Predicate<R>>,
    /// Requested output order
    pub order: Option<Order<R>>,
    /// Matching records to drop before emitting
    pub skip: u64,
    /// Maximum records to emit
    pub limit: Option<u64>,
}

impl<R> Query<R> {
    /// Creates an unfiltered, unordered query
    pub fn new() -> Self {
        Self {
            predicate: None,
            order: None,
            skip: 0,
            limit: None,
        }
    }

    /// Adds a predicate, conjoined with any already present
    pub fn with_predicate(mut self, predicate: Predicate<R>) -> Self {
        self.predicate = Some(match self.predicate.take() {
            Some(existing) => Predicate::And(vec![existing, predicate]),
            None => predicate,
        });
        self
    }

    /// Sets the output order
    pub fn with_order(mut self, order: Order<R>) -> Self {
        self.order = Some(order);
        self
    }

    /// Sets the number of matches to skip
    pub fn with_skip(mut self, skip: u64) -> Self {
        self.skip = skip;
        self
    }

    /// Sets the limit
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sort keys, empty when unordered
    pub fn order_keys(&self) -> &[SortSpec<R>] {
        match &self.order {
            Some(order) => &order.keys,
            None => &[],
        }
    }

    /// Ends the order with `primary_key` ascending.
    ///
    /// Ties then break the same way whichever index serves the query. A
    /// windowed query without an order reads in primary key order.
    pub fn with_tie_break(mut self, primary_key: &PropertyDescriptor<R>) -> Self {
        if let Some(order) = &mut self.order {
            if !order.keys.iter().any(|s| s.property.same_property(primary_key)) {
                order.keys.push(SortSpec::asc(primary_key.clone()));
            }
        } else if self.skip > 0 || self.limit.is_some() {
            self.order = Some(Order::asc(primary_key.clone()));
        }
        self
    }

    /// Copy of this query with its predicate simplified.
    ///
    /// A predicate that simplifies to `True` is dropped.
    pub fn simplified(&self) -> Self {
        let predicate = match self.predicate.as_ref().map(Predicate::simplify) {
            Some(Predicate::True) | None => None,
            other => other,
        };
        Self {
            predicate,
            order: self.order.clone(),
            skip: self.skip,
            limit: self.limit,
        }
    }
}

impl<R> Default for Query<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> Clone for Query<R> {
    fn clone(&self) -> Self {
        Self {
            predicate: self.predicate.clone(),
            order: self.order.clone(),
            skip: self.skip,
            limit: self.limit,
        }
    }
}

impl<R> fmt::Debug for Query<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("predicate", &self.predicate)
            .field("order", &self.order.as_ref().map(ToString::to_string))
            .field("skip", &self.skip)
            .field("limit", &self.limit)
            .finish()
    }
}
