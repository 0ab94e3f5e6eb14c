use crate::schema::DocumentSchema;
use docfilter_ast::Fragment;

/// A document store query that can be narrowed by predicate fragments.
///
/// Applying a filter set folds each filter's fragment into the queryset with
/// [`Queryset::filter`], in registry order. Successive fragments conjoin.
pub trait Queryset: Sized {
    fn filter(self, fragment: &Fragment) -> Self;

    /// The document type this queryset selects, when known
    fn document(&self) -> Option<&DocumentSchema> { None }
}
