use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("unknown {kind} `{value}`")]
    Unknown { kind: &'static str, value: String },
    #[error("project `{project}` is not available in department `{department}`")]
    ProjectNotPermitted { department: Department, project: Project },
    #[error("tool `{tool}` is not available in department `{department}`")]
    ToolNotPermitted { department: Department, tool: Tool },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Department {
    #[serde(rename = "Serendipity")]
    Serendipity,
    #[serde(rename = "Dhoom Studios")]
    DhoomStudios,
    #[serde(rename = "TradeMan")]
    TradeMan,
}

impl Department {
    pub const ALL: [Department; 3] = [Self::Serendipity, Self::DhoomStudios, Self::TradeMan];

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Serendipity => "Serendipity",
            Self::DhoomStudios => "Dhoom Studios",
            Self::TradeMan => "TradeMan",
        }
    }

    pub fn projects(&self) -> &'static [Project] {
        match self {
            Self::Serendipity => &[Project::AccQt, Project::HrQt],
            Self::DhoomStudios => &[Project::BrandQt],
            Self::TradeMan => &[Project::HakunaMatata],
        }
    }

    pub fn tools(&self) -> &'static [Tool] {
        match self {
            Self::Serendipity => &[Tool::ReconciliationAgent],
            Self::DhoomStudios => &[Tool::ScriptWriterAgent],
            Self::TradeMan => &[Tool::GitCommitterAgent, Tool::RepoInfoAgent],
        }
    }

    pub fn permits_project(&self, project: Project) -> bool {
        self.projects().contains(&project)
    }

    pub fn permits_tool(&self, tool: Tool) -> bool {
        self.tools().contains(&tool)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Admin,
    Manager,
    Executive,
}

impl Role {
    pub const ALL: [Role; 3] = [Self::Admin, Self::Manager, Self::Executive];

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Admin => "Admin",
            Self::Manager => "Manager",
            Self::Executive => "Executive",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Project {
    #[serde(rename = "AccQt")]
    AccQt,
    #[serde(rename = "HRQt")]
    HrQt,
    #[serde(rename = "BrandQt")]
    BrandQt,
    #[serde(rename = "Hakuna-Matata")]
    HakunaMatata,
}

impl Project {
    pub const ALL: [Project; 4] = [Self::AccQt, Self::HrQt, Self::BrandQt, Self::HakunaMatata];

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::AccQt => "AccQt",
            Self::HrQt => "HRQt",
            Self::BrandQt => "BrandQt",
            Self::HakunaMatata => "Hakuna-Matata",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tool {
    ReconciliationAgent,
    ScriptWriterAgent,
    GitCommitterAgent,
    RepoInfoAgent,
}

impl Tool {
    pub const ALL: [Tool; 4] = [
        Self::ReconciliationAgent,
        Self::ScriptWriterAgent,
        Self::GitCommitterAgent,
        Self::RepoInfoAgent,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::ReconciliationAgent => "ReconciliationAgent",
            Self::ScriptWriterAgent => "ScriptWriterAgent",
            Self::GitCommitterAgent => "GitCommitterAgent",
            Self::RepoInfoAgent => "RepoInfoAgent",
        }
    }

    /// Path segment of the tool's conversational endpoint (`/ws/<slug>`).
    pub fn endpoint_slug(&self) -> &'static str {
        match self {
            Self::ReconciliationAgent => "reconciliation",
            Self::ScriptWriterAgent => "script-writer",
            Self::GitCommitterAgent => "git-committer",
            Self::RepoInfoAgent => "repo-info",
        }
    }
}

macro_rules! catalog_text {
    ($ty:ident, $kind:literal) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.display_name())
            }
        }

        impl FromStr for $ty {
            type Err = CatalogError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                let wanted = normalize_key(value);
                $ty::ALL
                    .into_iter()
                    .find(|candidate| normalize_key(candidate.display_name()) == wanted)
                    .ok_or_else(|| CatalogError::Unknown {
                        kind: $kind,
                        value: value.trim().to_string(),
                    })
            }
        }
    };
}

catalog_text!(Department, "department");
catalog_text!(Role, "role");
catalog_text!(Project, "project");
catalog_text!(Tool, "tool");

fn normalize_key(value: &str) -> String {
    value
        .chars()
        .filter(|ch| !matches!(ch, ' ' | '-' | '_'))
        .map(|ch| ch.to_ascii_lowercase())
        .collect()
}

/// The resolved selection a conversation is bound to. Construction enforces that the tool
/// and (when present) the project belong to the department.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentBinding {
    department: Department,
    role: Option<Role>,
    project: Option<Project>,
    tool: Tool,
}

impl AgentBinding {
    pub fn new(
        department: Department,
        role: Option<Role>,
        project: Option<Project>,
        tool: Tool,
    ) -> Result<Self, CatalogError> {
        if let Some(project) = project {
            if !department.permits_project(project) {
                return Err(CatalogError::ProjectNotPermitted { department, project });
            }
        }
        if !department.permits_tool(tool) {
            return Err(CatalogError::ToolNotPermitted { department, tool });
        }

        Ok(Self { department, role, project, tool })
    }

    pub fn department(&self) -> Department {
        self.department
    }

    pub fn role(&self) -> Option<Role> {
        self.role
    }

    pub fn project(&self) -> Option<Project> {
        self.project
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn endpoint_url(&self, ws_base_url: &str) -> String {
        format!("{}/ws/{}", ws_base_url.trim_end_matches('/'), self.tool.endpoint_slug())
    }
}

#[cfg(test)]
mod tests {
    use super::{AgentBinding, CatalogError, Department, Project, Role, Tool};

    #[test]
    fn catalog_values_parse_from_display_names() {
        assert_eq!("dhoom studios".parse::<Department>(), Ok(Department::DhoomStudios));
        assert_eq!("DhoomStudios".parse::<Department>(), Ok(Department::DhoomStudios));
        assert_eq!("hakuna_matata".parse::<Project>(), Ok(Project::HakunaMatata));
        assert_eq!("HRQt".parse::<Project>(), Ok(Project::HrQt));
        assert_eq!("repo-info-agent".parse::<Tool>(), Ok(Tool::RepoInfoAgent));
        assert_eq!(" executive ".parse::<Role>(), Ok(Role::Executive));
    }

    #[test]
    fn unknown_catalog_value_is_rejected() {
        let error = "Marketing".parse::<Department>().expect_err("not a department");
        assert_eq!(error, CatalogError::Unknown { kind: "department", value: "Marketing".into() });
    }

    #[test]
    fn binding_rejects_tool_from_another_department() {
        let error = AgentBinding::new(Department::Serendipity, None, None, Tool::RepoInfoAgent)
            .expect_err("repo info belongs to TradeMan");
        assert_eq!(
            error,
            CatalogError::ToolNotPermitted {
                department: Department::Serendipity,
                tool: Tool::RepoInfoAgent
            }
        );
    }

    #[test]
    fn binding_rejects_project_from_another_department() {
        let error = AgentBinding::new(
            Department::TradeMan,
            Some(Role::Admin),
            Some(Project::BrandQt),
            Tool::GitCommitterAgent,
        )
        .expect_err("BrandQt belongs to Dhoom Studios");
        assert!(matches!(error, CatalogError::ProjectNotPermitted { .. }));
    }

    #[test]
    fn binding_resolves_conversational_endpoint() {
        let binding = AgentBinding::new(
            Department::TradeMan,
            None,
            Some(Project::HakunaMatata),
            Tool::GitCommitterAgent,
        )
        .expect("valid binding");
        assert_eq!(binding.endpoint_url("ws://localhost:8000/"), "ws://localhost:8000/ws/git-committer");
    }

    #[test]
    fn serde_uses_display_names() {
        let encoded = serde_json::to_string(&Department::DhoomStudios).expect("serialize");
        assert_eq!(encoded, "\"Dhoom Studios\"");
        let decoded: Project = serde_json::from_str("\"Hakuna-Matata\"").expect("deserialize");
        assert_eq!(decoded, Project::HakunaMatata);
    }
}
