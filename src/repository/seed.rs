//! Sample content for the fallback store and for `init-db`

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde_json::Value;

use super::document::{CASE_STUDIES, DAILY_POSTS};
use crate::models::{CaseStudy, DailyPost, MediaType};
use crate::validation::slugify;

struct SampleCase {
    title: &'static str,
    tags: &'static [&'static str],
    description: &'static str,
    image_key: &'static str,
    industry: &'static str,
    project_type: &'static str,
    company_type: &'static str,
    services: &'static [&'static str],
}

const SAMPLE_CASES: &[SampleCase] = &[
    SampleCase {
        title: "Authority Builder - Business Consultant Portfolio",
        tags: &["Copywriting", "Lead Generation", "Trust Building"],
        description: "A comprehensive business consultant portfolio designed to establish authority and generate high-quality leads.",
        image_key: "authority",
        industry: "Business Consulting",
        project_type: "Portfolio Website",
        company_type: "Independent Consultant",
        services: &["Web Design", "Copywriting", "SEO", "Lead Generation"],
    },
    SampleCase {
        title: "Architect Portfolio - Visual Storytelling",
        tags: &["Visual Design", "UX", "Architecture"],
        description: "A stunning visual portfolio showcasing architectural projects with immersive storytelling.",
        image_key: "architect",
        industry: "Architecture",
        project_type: "Portfolio Website",
        company_type: "Architecture Firm",
        services: &["Web Design", "Visual Design", "UX", "Photography Integration"],
    },
    SampleCase {
        title: "Marketing Agency - Results Machine",
        tags: &["ROI", "Analytics", "B2B"],
        description: "A data-driven marketing agency website focused on demonstrating ROI and client results.",
        image_key: "marketing",
        industry: "Marketing",
        project_type: "Agency Website",
        company_type: "Marketing Agency",
        services: &["Web Development", "Analytics", "Dashboard", "CRM Integration"],
    },
];

const SAMPLE_POSTS: &[(&str, &str, MediaType)] = &[
    (
        "Moodboard Monday",
        "Collecting textures and palettes for an upcoming studio rebrand.",
        MediaType::Image,
    ),
    (
        "Prototype walkthrough",
        "A quick screen recording of the new booking flow prototype.",
        MediaType::Video,
    ),
    (
        "Micro-interactions",
        "Hover states and loading animations for the pricing page.",
        MediaType::Gif,
    ),
];

/// Sample case studies, published and ordered from 1
pub fn sample_case_studies(now: DateTime<Utc>) -> Vec<CaseStudy> {
    SAMPLE_CASES
        .iter()
        .enumerate()
        .map(|(i, sample)| {
            let labels = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();
            let created_at = now - Duration::days(i as i64);
            CaseStudy {
                id: format!("sample-case-{}", i + 1),
                title: sample.title.to_string(),
                slug: slugify(sample.title),
                tags: labels(sample.tags),
                description: sample.description.to_string(),
                thumbnail_url: format!("/assets/case-{}.jpg", sample.image_key),
                detail_images: (1..=3)
                    .map(|n| format!("/assets/detail-{}-{}.jpg", sample.image_key, n))
                    .collect(),
                industry: sample.industry.to_string(),
                project_type: sample.project_type.to_string(),
                company_type: sample.company_type.to_string(),
                services: labels(sample.services),
                order: i as u32 + 1,
                is_published: true,
                created_at,
                updated_at: created_at,
            }
        })
        .collect()
}

pub fn sample_posts(now: DateTime<Utc>) -> Vec<DailyPost> {
    SAMPLE_POSTS
        .iter()
        .enumerate()
        .map(|(i, (title, description, media_type))| {
            let extension = match media_type {
                MediaType::Image => "jpg",
                MediaType::Video => "mp4",
                MediaType::Gif => "gif",
            };
            DailyPost {
                id: format!("sample-post-{}", i + 1),
                title: title.to_string(),
                description: description.to_string(),
                media_url: Some(format!("/assets/daily-{}.{}", i + 1, extension)),
                media_type: Some(*media_type),
                file_size: None,
                order: i as u32,
                is_active: true,
                created_at: now,
                updated_at: now,
            }
        })
        .collect()
}

fn to_documents<T: Serialize>(items: Vec<T>) -> Vec<Value> {
    items
        .iter()
        .filter_map(|item| serde_json::to_value(item).ok())
        .collect()
}

/// Seed documents per collection
pub fn sample_documents() -> Vec<(&'static str, Vec<Value>)> {
    let now = Utc::now();
    vec![
        (CASE_STUDIES, to_documents(sample_case_studies(now))),
        (DAILY_POSTS, to_documents(sample_posts(now))),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::post::MAX_ACTIVE_POSTS;
    use std::collections::HashSet;

    #[test]
    fn test_sample_slugs_are_unique() {
        let cases = sample_case_studies(Utc::now());
        let slugs: HashSet<_> = cases.iter().map(|c| c.slug.as_str()).collect();
        assert_eq!(slugs.len(), cases.len());
        assert!(slugs.contains("architect-portfolio-visual-storytelling"));
    }

    #[test]
    fn test_sample_posts_leave_a_free_slot() {
        let posts = sample_posts(Utc::now());
        assert!((posts.len() as u64) < MAX_ACTIVE_POSTS);
    }

    #[test]
    fn test_documents_carry_ids() {
        for (collection, docs) in sample_documents() {
            assert!(!docs.is_empty(), "{collection} has no samples");
            for doc in docs {
                assert!(doc.get("id").and_then(Value::as_str).is_some());
            }
        }
    }
}
