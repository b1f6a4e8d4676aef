use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::AdminError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Done,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Done => "done",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = AdminError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "in_progress" => Ok(Self::InProgress),
            "done" => Ok(Self::Done),
            _ => Err(AdminError::InvalidStatus(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub order: i32,
    pub status: TaskStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl Project {
    /// Share of tasks marked done, rounded to a whole percent. A project
    /// without tasks is at 0%.
    pub fn completion_percent(&self) -> u8 {
        let total = self.tasks.len().max(1);
        let done = self
            .tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Done)
            .count();
        ((done as f64 / total as f64) * 100.0).round() as u8
    }

    pub fn ordered_tasks(&self) -> Vec<&Task> {
        let mut tasks: Vec<&Task> = self.tasks.iter().collect();
        tasks.sort_by_key(|t| t.order);
        tasks
    }

    fn matches(&self, query: &str) -> bool {
        self.title.to_lowercase().contains(query) || self.description.to_lowercase().contains(query)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub tg_id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub projects: Vec<Project>,
}

impl User {
    fn matches(&self, query: &str) -> bool {
        self.name.to_lowercase().contains(query) || self.email.to_lowercase().contains(query)
    }
}

/// Response body of `GET /admin/users`.
#[derive(Debug, Clone, Deserialize)]
pub struct UsersResponse {
    pub users: Vec<User>,
}

/// Narrow `users` to projects matching `query`.
///
/// Matching is a case-insensitive substring test against the project's
/// title and description and the owner's name and email. Users left with
/// no projects are dropped. A blank query returns everything unchanged.
pub fn filter_users(users: &[User], query: &str) -> Vec<User> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return users.to_vec();
    }
    users
        .iter()
        .filter_map(|user| {
            let owner_matches = user.matches(&query);
            let projects: Vec<Project> = user
                .projects
                .iter()
                .filter(|p| owner_matches || p.matches(&query))
                .cloned()
                .collect();
            (!projects.is_empty()).then(|| User {
                projects,
                ..user.clone()
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: i64, order: i32, status: TaskStatus) -> Task {
        Task {
            id,
            title: format!("Task {}", id),
            order,
            status,
        }
    }

    fn sample_users() -> Vec<User> {
        vec![
            User {
                id: 1,
                tg_id: "100".to_string(),
                name: "Alice".to_string(),
                email: "alice@example.com".to_string(),
                projects: vec![
                    Project {
                        id: 10,
                        title: "Habit Bot".to_string(),
                        description: "Telegram reminders".to_string(),
                        tasks: vec![],
                    },
                    Project {
                        id: 11,
                        title: "Recipe Box".to_string(),
                        description: "Meal planning".to_string(),
                        tasks: vec![],
                    },
                ],
            },
            User {
                id: 2,
                tg_id: "200".to_string(),
                name: "Bob".to_string(),
                email: "bob@example.org".to_string(),
                projects: vec![Project {
                    id: 20,
                    title: "Budget App".to_string(),
                    description: "Track spending with a bot".to_string(),
                    tasks: vec![],
                }],
            },
        ]
    }

    #[test]
    fn test_task_status_parse_and_display() {
        assert_eq!("in_progress".parse::<TaskStatus>().unwrap(), TaskStatus::InProgress);
        assert_eq!(TaskStatus::Done.to_string(), "done");
        assert!(matches!(
            "blocked".parse::<TaskStatus>(),
            Err(AdminError::InvalidStatus(_))
        ));
    }

    #[test]
    fn test_task_status_serde_snake_case() {
        let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
    }

    #[test]
    fn test_completion_percent() {
        let mut project = Project {
            id: 1,
            title: "P".to_string(),
            description: String::new(),
            tasks: vec![],
        };
        assert_eq!(project.completion_percent(), 0);

        project.tasks = vec![
            task(1, 0, TaskStatus::Done),
            task(2, 1, TaskStatus::Pending),
            task(3, 2, TaskStatus::InProgress),
        ];
        assert_eq!(project.completion_percent(), 33);

        project.tasks[1].status = TaskStatus::Done;
        assert_eq!(project.completion_percent(), 67);
    }

    #[test]
    fn test_ordered_tasks() {
        let project = Project {
            id: 1,
            title: "P".to_string(),
            description: String::new(),
            tasks: vec![
                task(1, 2, TaskStatus::Done),
                task(2, 0, TaskStatus::Pending),
                task(3, 1, TaskStatus::Pending),
            ],
        };
        let ids: Vec<i64> = project.ordered_tasks().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn test_filter_blank_query_returns_all() {
        let users = sample_users();
        assert_eq!(filter_users(&users, "   "), users);
    }

    #[test]
    fn test_filter_by_project_title_keeps_only_matching_projects() {
        let filtered = filter_users(&sample_users(), "RECIPE");
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].name, "Alice");
        assert_eq!(filtered[0].projects.len(), 1);
        assert_eq!(filtered[0].projects[0].id, 11);
    }

    #[test]
    fn test_filter_by_description_across_users() {
        let filtered = filter_users(&sample_users(), "bot");
        // "Habit Bot" by title, "Track spending with a bot" by description.
        let ids: Vec<i64> = filtered
            .iter()
            .flat_map(|u| u.projects.iter().map(|p| p.id))
            .collect();
        assert_eq!(ids, vec![10, 20]);
    }

    #[test]
    fn test_filter_by_owner_keeps_all_their_projects() {
        let filtered = filter_users(&sample_users(), "example.org");
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].name, "Bob");
        assert_eq!(filtered[0].projects.len(), 1);
    }

    #[test]
    fn test_filter_no_match() {
        assert!(filter_users(&sample_users(), "kubernetes").is_empty());
    }

    #[test]
    fn test_users_response_tolerates_missing_collections() {
        let body = r#"{"users":[{"id":1,"tg_id":"1","name":"A","email":"a@b.c"}]}"#;
        let parsed: UsersResponse = serde_json::from_str(body).unwrap();
        assert!(parsed.users[0].projects.is_empty());
    }
}
