//! Terms connection, one resolver per taxonomy.

use crate::entities::{Post, Term};
use crate::query::{allowed, contains_ci, not_excluded, paginate, NativeArgs, Record, SortValue};
use crate::store::ContentStore;
use async_trait::async_trait;
use pressgql_connection::{
    EntityKind, FieldMapping, OrderField, QuerySpec, Scope, SortOrder, TranslationTable,
};
use pressgql_core::BackendError;
use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::Arc;

const ENTITY: &str = "terms";

const NAME: OrderField = OrderField::new("NAME", "name");

const ORDER_FIELDS: &[OrderField] = &[
    NAME,
    OrderField::new("SLUG", "slug"),
    OrderField::new("TERM_ID", "id"),
    OrderField::new("COUNT", "count"),
    OrderField::new("DESCRIPTION", "description"),
    OrderField::new("TERM_ORDER", "term_order"),
    OrderField::new("INCLUDE", "include").requires("include"),
];

const TABLE: TranslationTable = TranslationTable::new(&[
    ("objectIds", FieldMapping::Rename("object_ids")),
    ("hideEmpty", FieldMapping::Rename("hide_empty")),
    ("include", FieldMapping::Rename("include")),
    ("exclude", FieldMapping::Rename("exclude")),
    ("name", FieldMapping::Rename("name")),
    ("slug", FieldMapping::Rename("slug")),
    ("search", FieldMapping::Rename("search")),
    ("nameLike", FieldMapping::Rename("name__like")),
    ("descriptionLike", FieldMapping::Rename("description__like")),
    ("parent", FieldMapping::Rename("parent")),
    ("childOf", FieldMapping::Rename("child_of")),
    ("childless", FieldMapping::Rename("childless")),
    ("termTaxonomyId", FieldMapping::Rename("term_taxonomy_id")),
    ("taxonomies", FieldMapping::Rename("taxonomy")),
    ("cacheDomain", FieldMapping::Drop),
    ("updateTermMetaCache", FieldMapping::Drop),
]);

const KNOWN: &[&str] = &[
    "object_ids",
    "hide_empty",
    "include",
    "exclude",
    "name",
    "slug",
    "search",
    "name__like",
    "description__like",
    "parent",
    "child_of",
    "childless",
    "term_taxonomy_id",
    "taxonomy",
];

/// What a terms connection can hang off of.
#[derive(Debug, Clone)]
pub enum TermSource {
    /// Terms assigned to a post.
    Post(Post),
    /// Direct children of a term.
    Children(Term),
}

/// Terms of a single taxonomy, alphabetical.
#[derive(Debug, Clone)]
pub struct TermKind {
    store: Arc<ContentStore>,
    taxonomy: String,
}

impl TermKind {
    pub fn new(store: Arc<ContentStore>, taxonomy: impl Into<String>) -> Self {
        Self {
            store,
            taxonomy: taxonomy.into(),
        }
    }

    pub fn taxonomy(&self) -> &str {
        &self.taxonomy
    }
}

impl Record for Term {
    fn sort_value(&self, field: &OrderField, args: &NativeArgs<'_>) -> Option<SortValue> {
        match field.native {
            "name" => Some(SortValue::text(&self.name)),
            "slug" => Some(SortValue::text(&self.slug)),
            "count" => Some(SortValue::Uint(self.count)),
            "description" => Some(SortValue::text(&self.description)),
            "term_order" => Some(SortValue::Int(self.term_order)),
            "include" => SortValue::position(args.ids("include").as_deref(), &self.id),
            _ => None,
        }
    }
}

/// Ids of every descendant of `root`.
fn descendants(terms: &[Term], root: u64) -> FxHashSet<u64> {
    let mut found = FxHashSet::default();
    let mut frontier = vec![root];
    while let Some(parent) = frontier.pop() {
        for term in terms.iter().filter(|t| t.parent_id == parent) {
            if found.insert(term.id) {
                frontier.push(term.id);
            }
        }
    }
    found
}

#[async_trait]
impl EntityKind for TermKind {
    type Source = TermSource;
    type Node = Term;

    fn name(&self) -> &'static str {
        ENTITY
    }

    fn translation_table(&self) -> &TranslationTable {
        &TABLE
    }

    fn order_fields(&self) -> &'static [OrderField] {
        ORDER_FIELDS
    }

    fn default_order(&self) -> (OrderField, SortOrder) {
        (NAME, SortOrder::Asc)
    }

    fn plan_scope(&self, source: Option<&TermSource>) -> Scope {
        let scope = Scope::none().strict("taxonomy", self.taxonomy.as_str());
        match source {
            None => scope,
            Some(TermSource::Post(post)) => scope.strict("object_ids", vec![post.id]),
            Some(TermSource::Children(term)) => scope.strict("parent", term.id),
        }
    }

    async fn execute(&self, spec: &QuerySpec) -> Result<Vec<Term>, BackendError> {
        self.store.ensure_available(ENTITY)?;
        let args = NativeArgs::new(&spec.native_args);
        args.trace_unknown(ENTITY, KNOWN);

        let object_ids = args.ids("object_ids");
        let mut counts: FxHashMap<u64, u64> = FxHashMap::default();
        let mut assigned: FxHashSet<u64> = FxHashSet::default();
        for post in self.store.posts().await.iter() {
            if post.status == "publish" {
                for term in &post.term_ids {
                    *counts.entry(*term).or_default() += 1;
                }
            }
            if allowed(object_ids.as_ref(), &post.id) {
                assigned.extend(post.term_ids.iter().copied());
            }
        }

        let terms: Vec<Term> = self
            .store
            .terms()
            .await
            .iter()
            .map(|term| Term {
                count: counts.get(&term.id).copied().unwrap_or_default(),
                ..term.clone()
            })
            .collect();

        let taxonomies = args.strs("taxonomy");
        let hide_empty = args.bool("hide_empty").unwrap_or(false);
        let include = args.ids("include");
        let exclude = args.ids("exclude");
        let names = args.strs("name");
        let slugs = args.strs("slug");
        let search = args.str("search");
        let name_like = args.str("name__like");
        let description_like = args.str("description__like");
        let parent = args.u64("parent");
        let child_of = args.u64("child_of").map(|root| descendants(&terms, root));
        let childless = args.bool("childless").unwrap_or(false);
        let taxonomy_ids = args.ids("term_taxonomy_id");
        let parents: FxHashSet<u64> = terms.iter().map(|t| t.parent_id).collect();

        let candidates: Vec<Term> = terms
            .iter()
            .filter(|t| allowed(taxonomies.as_ref(), &t.taxonomy))
            .filter(|t| object_ids.is_none() || assigned.contains(&t.id))
            .filter(|t| !hide_empty || t.count > 0)
            .filter(|t| allowed(include.as_ref(), &t.id))
            .filter(|t| not_excluded(exclude.as_ref(), &t.id))
            .filter(|t| allowed(names.as_ref(), &t.name))
            .filter(|t| allowed(slugs.as_ref(), &t.slug))
            .filter(|t| search.map_or(true, |s| contains_ci(&t.name, s) || contains_ci(&t.slug, s)))
            .filter(|t| name_like.map_or(true, |s| contains_ci(&t.name, s)))
            .filter(|t| description_like.map_or(true, |s| contains_ci(&t.description, s)))
            .filter(|t| parent.map_or(true, |p| t.parent_id == p))
            .filter(|t| child_of.as_ref().map_or(true, |ids| ids.contains(&t.id)))
            .filter(|t| !childless || !parents.contains(&t.id))
            .filter(|t| allowed(taxonomy_ids.as_ref(), &t.id))
            .cloned()
            .collect();

        paginate(ENTITY, candidates, &terms, spec)
    }
}
