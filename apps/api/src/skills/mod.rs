//! Profile skill management: listing, single additions, and bulk merge of
//! skills extracted from a resume.

use serde::Deserialize;

use crate::models::user::{Skill, DEFAULT_SKILL_CATEGORY};

pub mod handlers;

/// Level given to extracted skills that arrive without one. Extraction
/// implies the skill was actually used somewhere, so "Beginner" would
/// undersell it.
const EXTRACTED_SKILL_LEVEL: &str = "Intermediate";

/// A skill as it arrives from the extraction pipeline: name only, with
/// level and category optional.
#[derive(Debug, Clone, Deserialize)]
pub struct IncomingSkill {
    pub name: String,
    #[serde(default)]
    pub level: String,
    #[serde(default)]
    pub category: String,
}

#[derive(Debug, Default, PartialEq)]
pub struct MergeOutcome {
    pub added: usize,
    pub updated: usize,
}

/// Case-insensitively merges extracted skills into a profile list.
///
/// Existing entries are updated in place (level, category, verified flag);
/// unseen names are appended as verified. Blank names are dropped.
pub fn merge_skills(profile: &mut Vec<Skill>, incoming: Vec<IncomingSkill>) -> MergeOutcome {
    let mut outcome = MergeOutcome::default();
    for raw in incoming {
        let name = raw.name.trim().to_string();
        if name.is_empty() {
            continue;
        }
        let level = non_blank_or(raw.level, EXTRACTED_SKILL_LEVEL);
        let category = non_blank_or(raw.category, DEFAULT_SKILL_CATEGORY);

        match profile
            .iter_mut()
            .find(|existing| existing.name.eq_ignore_ascii_case(&name))
        {
            Some(existing) => {
                existing.level = level;
                existing.category = category;
                existing.verified = true;
                outcome.updated += 1;
            }
            None => {
                profile.push(Skill {
                    name,
                    level,
                    category,
                    verified: true,
                });
                outcome.added += 1;
            }
        }
    }
    outcome
}

fn non_blank_or(value: String, fallback: &str) -> String {
    if value.trim().is_empty() {
        fallback.to_string()
    } else {
        value
    }
}
