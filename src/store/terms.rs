//! Shared CRUD for categories and tags

use std::collections::BTreeMap;

use super::Database;
use crate::content::{Category, Tag, TermInput};
use crate::error::{Error, Result};

/// A taxonomy table: categories or tags
pub(super) trait Term: Clone + Sized {
    const KIND: &'static str;

    fn build(id: u64, input: &TermInput) -> Self;
    fn id(&self) -> u64;
    fn slug(&self) -> &str;

    fn table(db: &Database) -> &BTreeMap<u64, Self>;
    fn table_mut(db: &mut Database) -> &mut BTreeMap<u64, Self>;
    fn next_id(db: &mut Database) -> u64;

    /// Drop references to the term `id` from posts
    fn detach(db: &mut Database, id: u64);
}

impl Term for Category {
    const KIND: &'static str = "category";

    fn build(id: u64, input: &TermInput) -> Self {
        Self {
            id,
            name: input.name.trim().to_string(),
            description: input.description.clone(),
            slug: input.resolved_slug(),
        }
    }

    fn id(&self) -> u64 {
        self.id
    }

    fn slug(&self) -> &str {
        &self.slug
    }

    fn table(db: &Database) -> &BTreeMap<u64, Self> {
        &db.categories
    }

    fn table_mut(db: &mut Database) -> &mut BTreeMap<u64, Self> {
        &mut db.categories
    }

    fn next_id(db: &mut Database) -> u64 {
        db.next_category_id += 1;
        db.next_category_id
    }

    fn detach(db: &mut Database, id: u64) {
        for post in db.posts.values_mut() {
            if post.category == Some(id) {
                post.category = None;
            }
        }
    }
}

impl Term for Tag {
    const KIND: &'static str = "tag";

    fn build(id: u64, input: &TermInput) -> Self {
        Self {
            id,
            name: input.name.trim().to_string(),
            description: input.description.clone(),
            slug: input.resolved_slug(),
        }
    }

    fn id(&self) -> u64 {
        self.id
    }

    fn slug(&self) -> &str {
        &self.slug
    }

    fn table(db: &Database) -> &BTreeMap<u64, Self> {
        &db.tags
    }

    fn table_mut(db: &mut Database) -> &mut BTreeMap<u64, Self> {
        &mut db.tags
    }

    fn next_id(db: &mut Database) -> u64 {
        db.next_tag_id += 1;
        db.next_tag_id
    }

    fn detach(db: &mut Database, id: u64) {
        for post in db.posts.values_mut() {
            post.tags.remove(&id);
        }
    }
}

pub(super) fn get<T: Term>(db: &Database, id: u64) -> Result<T> {
    T::table(db)
        .get(&id)
        .cloned()
        .ok_or_else(|| Error::NotFound(format!("{} {}", T::KIND, id)))
}

pub(super) fn by_slug<T: Term>(db: &Database, slug: &str) -> Option<T> {
    T::table(db).values().find(|t| t.slug() == slug).cloned()
}

fn ensure_slug_free<T: Term>(db: &Database, term: &T) -> Result<()> {
    let taken = T::table(db)
        .values()
        .any(|t| t.id() != term.id() && t.slug() == term.slug());
    if taken {
        return Err(Error::Conflict(format!(
            "a {} with slug '{}' already exists",
            T::KIND,
            term.slug()
        )));
    }
    Ok(())
}

pub(super) fn create<T: Term>(db: &mut Database, input: &TermInput) -> Result<T> {
    input.validate()?;
    let id = T::next_id(db);
    let term = T::build(id, input);
    ensure_slug_free(db, &term)?;
    T::table_mut(db).insert(id, term.clone());
    tracing::info!("Created {} '{}'", T::KIND, term.slug());
    Ok(term)
}

/// The term with the slug `input` resolves to, created if missing
pub(super) fn find_or_create<T: Term>(db: &mut Database, input: &TermInput) -> Result<T> {
    match by_slug(db, &input.resolved_slug()) {
        Some(term) => Ok(term),
        None => create(db, input),
    }
}

pub(super) fn update<T: Term>(db: &mut Database, id: u64, input: &TermInput) -> Result<T> {
    input.validate()?;
    get::<T>(db, id)?;
    let term = T::build(id, input);
    ensure_slug_free(db, &term)?;
    T::table_mut(db).insert(id, term.clone());
    Ok(term)
}

pub(super) fn delete<T: Term>(db: &mut Database, id: u64) -> Result<T> {
    let term = T::table_mut(db)
        .remove(&id)
        .ok_or_else(|| Error::NotFound(format!("{} {}", T::KIND, id)))?;
    T::detach(db, id);
    tracing::info!("Deleted {} '{}'", T::KIND, term.slug());
    Ok(term)
}
