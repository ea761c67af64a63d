// File: edugate-common/src/models/entitlement.rs

use std::collections::BTreeSet;

use serde::Serialize;
use uuid::Uuid;

use crate::models::catalog::Course;
use crate::models::code_pool::PoolEntitlements;

/// Everything a student may currently open, derived from the redemptions
/// that still re-validate against their pools.
///
/// Built as a set union, so the order redemptions are folded in never
/// changes the result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitlementSet {
    pub materials_with_questions: BTreeSet<Uuid>,
    pub materials_with_lectures: BTreeSet<Uuid>,
    pub courses: BTreeSet<Uuid>,
    /// Pools whose claims validated.
    pub pools: BTreeSet<Uuid>,
}

impl EntitlementSet {
    pub fn absorb(&mut self, pool_id: Uuid, grants: &PoolEntitlements) {
        self.pools.insert(pool_id);
        self.materials_with_questions
            .extend(grants.materials_with_questions.iter().copied());
        self.materials_with_lectures
            .extend(grants.materials_with_lectures.iter().copied());
        self.courses.extend(grants.courses.iter().copied());
    }

    /// Materials unlocked for anything at all.
    pub fn materials(&self) -> BTreeSet<Uuid> {
        self.materials_with_questions
            .union(&self.materials_with_lectures)
            .copied()
            .collect()
    }

    pub fn has_material(&self, material_id: Uuid) -> bool {
        self.materials_with_questions.contains(&material_id)
            || self.materials_with_lectures.contains(&material_id)
    }

    pub fn can_view_lectures(&self, material_id: Uuid) -> bool {
        self.materials_with_lectures.contains(&material_id)
    }

    pub fn can_view_questions(&self, material_id: Uuid) -> bool {
        self.materials_with_questions.contains(&material_id)
    }

    /// Direct course grant, or any grant on the course's parent material.
    pub fn can_view_course(&self, course: &Course) -> bool {
        if self.courses.contains(&course.course_id) {
            return true;
        }
        course
            .material_id
            .map(|m| self.has_material(m))
            .unwrap_or(false)
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }
}

/// A piece of paid content a request wants to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Material(Uuid),
    MaterialLectures(Uuid),
    MaterialQuestions(Uuid),
    Course(Uuid),
    CourseFiles(Uuid),
    Video(Uuid),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    /// No validated redemption covers the resource.
    NotEntitled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Allowed,
    Denied(DenyReason),
}

impl AccessDecision {
    pub fn from_bool(allowed: bool) -> Self {
        if allowed {
            AccessDecision::Allowed
        } else {
            AccessDecision::Denied(DenyReason::NotEntitled)
        }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, AccessDecision::Allowed)
    }
}
