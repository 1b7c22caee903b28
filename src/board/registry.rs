use serde::{Deserialize, Serialize};

/// Kind of content tracked on a board. Fixed at item creation and
/// selects which status workflow applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Campaign,
    Routine,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Campaign => "campaign",
            ContentType::Routine => "routine",
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Workflow status of a content piece. One enum covers both content
/// types; `Published` is shared between them. The serialized names are
/// also the column identifiers used by drop targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    // Campaign workflow
    ProductObtained,
    Production,
    Payment,
    Done,
    // Routine workflow
    Plan,
    InProgress,
    Scheduled,
    // Shared by both workflows
    Published,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::ProductObtained => "product_obtained",
            Status::Production => "production",
            Status::Payment => "payment",
            Status::Done => "done",
            Status::Plan => "plan",
            Status::InProgress => "in_progress",
            Status::Scheduled => "scheduled",
            Status::Published => "published",
        }
    }

    /// Parses a column identifier back into a status.
    pub fn parse(id: &str) -> Option<Status> {
        match id {
            "product_obtained" => Some(Status::ProductObtained),
            "production" => Some(Status::Production),
            "payment" => Some(Status::Payment),
            "done" => Some(Status::Done),
            "plan" => Some(Status::Plan),
            "in_progress" => Some(Status::InProgress),
            "scheduled" => Some(Status::Scheduled),
            "published" => Some(Status::Published),
            _ => None,
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display metadata for one board column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ColumnMeta {
    pub status: Status,
    pub label: &'static str,
    pub accent: &'static str,
}

/// Ordered set of valid statuses for one content type. Order defines
/// column display order only; any status in the set may transition to
/// any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusWorkflow {
    pub content_type: ContentType,
    pub columns: &'static [ColumnMeta],
}

impl StatusWorkflow {
    pub fn statuses(&self) -> impl Iterator<Item = Status> + '_ {
        self.columns.iter().map(|c| c.status)
    }

    pub fn contains(&self, status: Status) -> bool {
        self.columns.iter().any(|c| c.status == status)
    }

    /// Column display position of a status, if it belongs to this workflow.
    pub fn column_index(&self, status: Status) -> Option<usize> {
        self.columns.iter().position(|c| c.status == status)
    }

    /// Resolves a column identifier to a status of this workflow.
    /// Identifiers naming columns of the other workflow do not resolve.
    pub fn column_for_id(&self, id: &str) -> Option<Status> {
        Status::parse(id).filter(|s| self.contains(*s))
    }
}

pub static CAMPAIGN_WORKFLOW: StatusWorkflow = StatusWorkflow {
    content_type: ContentType::Campaign,
    columns: &[
        ColumnMeta {
            status: Status::ProductObtained,
            label: "Product obtained",
            accent: "#8b5cf6",
        },
        ColumnMeta {
            status: Status::Production,
            label: "Production",
            accent: "#3b82f6",
        },
        ColumnMeta {
            status: Status::Published,
            label: "Published",
            accent: "#10b981",
        },
        ColumnMeta {
            status: Status::Payment,
            label: "Payment",
            accent: "#f59e0b",
        },
        ColumnMeta {
            status: Status::Done,
            label: "Done",
            accent: "#6b7280",
        },
    ],
};

pub static ROUTINE_WORKFLOW: StatusWorkflow = StatusWorkflow {
    content_type: ContentType::Routine,
    columns: &[
        ColumnMeta {
            status: Status::Plan,
            label: "Plan",
            accent: "#8b5cf6",
        },
        ColumnMeta {
            status: Status::InProgress,
            label: "In progress",
            accent: "#3b82f6",
        },
        ColumnMeta {
            status: Status::Scheduled,
            label: "Scheduled",
            accent: "#f59e0b",
        },
        ColumnMeta {
            status: Status::Published,
            label: "Published",
            accent: "#10b981",
        },
    ],
};

/// Lookup of the status workflow for a content type.
pub fn statuses_for(content_type: ContentType) -> &'static StatusWorkflow {
    match content_type {
        ContentType::Campaign => &CAMPAIGN_WORKFLOW,
        ContentType::Routine => &ROUTINE_WORKFLOW,
    }
}
