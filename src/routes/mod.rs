// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Navigation routes and the auth guard.

pub mod guard;

pub use guard::{evaluate, GuardDecision, RouteGuard};

use std::fmt;

/// The app's navigable screens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Landing page at `/`.
    Landing,
    /// Combined sign-in / registration screen.
    Auth,
    /// Task list.
    Tasks,
    /// Read-only view of one task.
    TaskDetail(String),
    /// Task form; with `edit` set it edits an existing task.
    AddTask { edit: Option<String> },
}

impl Route {
    /// Parse a path with optional query into a route.
    ///
    /// Trailing slashes are ignored; unknown paths give `None`.
    pub fn parse(target: &str) -> Option<Route> {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (target, None),
        };
        let path = if path.len() > 1 {
            path.trim_end_matches('/')
        } else {
            path
        };

        match path {
            "" | "/" => Some(Route::Landing),
            "/auth" => Some(Route::Auth),
            "/tasks" => Some(Route::Tasks),
            "/add-task" => {
                let edit = query
                    .and_then(|q| query_param(q, "id"))
                    .filter(|id| !id.is_empty())
                    .map(str::to_string);
                Some(Route::AddTask { edit })
            }
            _ => path.strip_prefix("/tasks/").and_then(|id| {
                if id.is_empty() || id.contains('/') {
                    None
                } else {
                    Some(Route::TaskDetail(id.to_string()))
                }
            }),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Landing => f.write_str("/"),
            Route::Auth => f.write_str("/auth"),
            Route::Tasks => f.write_str("/tasks"),
            Route::TaskDetail(id) => write!(f, "/tasks/{}", id),
            Route::AddTask { edit: None } => f.write_str("/add-task"),
            Route::AddTask { edit: Some(id) } => write!(f, "/add-task?id={}", id),
        }
    }
}

fn query_param<'a>(query: &'a str, key: &str) -> Option<&'a str> {
    query.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        (k == key).then_some(v)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_routes() {
        assert_eq!(Route::parse("/"), Some(Route::Landing));
        assert_eq!(Route::parse("/auth"), Some(Route::Auth));
        assert_eq!(Route::parse("/tasks"), Some(Route::Tasks));
        assert_eq!(Route::parse("/tasks/"), Some(Route::Tasks));
        assert_eq!(
            Route::parse("/tasks/abc-123"),
            Some(Route::TaskDetail("abc-123".to_string()))
        );
        assert_eq!(
            Route::parse("/add-task"),
            Some(Route::AddTask { edit: None })
        );
        assert_eq!(
            Route::parse("/add-task?id=t1"),
            Some(Route::AddTask {
                edit: Some("t1".to_string())
            })
        );
    }

    #[test]
    fn test_parse_edge_cases() {
        // Empty edit id means a plain create form.
        assert_eq!(
            Route::parse("/add-task?id="),
            Some(Route::AddTask { edit: None })
        );
        assert_eq!(
            Route::parse("/add-task?from=nav&id=t2"),
            Some(Route::AddTask {
                edit: Some("t2".to_string())
            })
        );
        assert_eq!(Route::parse("/tasks/a/b"), None);
        assert_eq!(Route::parse("/nope"), None);
    }

    #[test]
    fn test_format_round_trip() {
        let routes = [
            Route::Landing,
            Route::Auth,
            Route::Tasks,
            Route::TaskDetail("t-9".to_string()),
            Route::AddTask { edit: None },
            Route::AddTask {
                edit: Some("t-9".to_string()),
            },
        ];
        for route in routes {
            assert_eq!(Route::parse(&route.to_string()), Some(route));
        }
    }
}
