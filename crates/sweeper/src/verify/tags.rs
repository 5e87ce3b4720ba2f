//! Planning `tags_all`, the merge of provider wide default tags and a
//! resource's own tags.
use std::collections::{BTreeMap, BTreeSet};

pub type TagMap = BTreeMap<String, String>;

/// Tags applied to every resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DefaultTagsConfig {
    pub tags: TagMap,
}

impl DefaultTagsConfig {
    /// The default tags overlaid with `resource` tags. Resource tags win.
    pub fn merge_tags(&self, resource: &TagMap) -> TagMap {
        let mut merged = self.tags.clone();
        merged.extend(resource.iter().map(|(k, v)| (k.clone(), v.clone())));
        merged
    }
}

/// Tags that are managed outside and must never show up in a plan.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct IgnoreTagsConfig {
    pub keys: BTreeSet<String>,
    pub key_prefixes: Vec<String>,
}

impl IgnoreTagsConfig {
    pub fn is_ignored(&self, key: &str) -> bool {
        self.keys.contains(key) || self.key_prefixes.iter().any(|p| key.starts_with(p.as_str()))
    }

    pub fn apply(&self, mut tags: TagMap) -> TagMap {
        tags.retain(|k, _| !self.is_ignored(k));
        tags
    }
}

/// A planned value of the resource's `tags`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tags {
    Known(TagMap),
    /// Not known until apply, eg. interpolated from another resource.
    Unknown,
}

/// The stored state of a resource that already exists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PriorState {
    pub tags: TagMap,
    pub tags_all: TagMap,
}

/// What to plan for `tags_all`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagsAllPlan {
    /// Known after planning.
    Set(TagMap),
    /// Known only after apply.
    Computed,
    NoChange,
}

/// Plan `tags_all` for a resource.
///
/// `prior` is `None` while the resource is being created. Missing tag
/// configs mean no default tags and nothing ignored.
pub fn set_tags_diff(
    resource_tags: &Tags,
    prior: Option<&PriorState>,
    default_tags: Option<&DefaultTagsConfig>,
    ignore_tags: Option<&IgnoreTagsConfig>,
) -> TagsAllPlan {
    let Tags::Known(resource_tags) = resource_tags else {
        return TagsAllPlan::Computed;
    };
    let merged = match default_tags {
        Some(defaults) => defaults.merge_tags(resource_tags),
        None => resource_tags.clone(),
    };
    let all = match ignore_tags {
        Some(ignore) => ignore.apply(merged),
        None => merged,
    };

    if !all.is_empty() {
        return TagsAllPlan::Set(all);
    }
    let Some(prior) = prior else {
        // nothing stored yet
        return TagsAllPlan::Computed;
    };
    if !prior.tags_all.is_empty() || prior.tags != *resource_tags {
        TagsAllPlan::Computed
    } else {
        TagsAllPlan::NoChange
    }
}
