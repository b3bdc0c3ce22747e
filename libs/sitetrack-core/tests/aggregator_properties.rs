use proptest::prelude::*;
use sitetrack_core::{
    build_project_views, build_task_views, build_user_views, client_financials, count_by_status,
    project_progress, user_task_breakdown, Client, EntityRef, FinancialRecord, Project,
    ProjectStatus, Role, Snapshot, Task, TaskPriority, TaskStatus, TransactionType, User,
};

fn task_status() -> impl Strategy<Value = TaskStatus> {
    prop::sample::select(TaskStatus::ALL.to_vec())
}

fn reference(pool: &'static [&'static str]) -> impl Strategy<Value = Option<EntityRef>> {
    prop::option::of(prop::sample::select(pool).prop_map(EntityRef::new))
}

const PROJECT_IDS: &[&str] = &["p1", "p2", "p3"];
const USER_IDS: &[&str] = &["u1", "u2"];

fn task() -> impl Strategy<Value = Task> {
    (
        "[a-z]{1,6}",
        task_status(),
        reference(PROJECT_IDS),
        reference(USER_IDS),
    )
        .prop_map(|(id, status, project, assigned_to)| Task {
            id,
            title: String::new(),
            description: String::new(),
            status,
            priority: TaskPriority::Medium,
            project,
            assigned_to,
            due_date: None,
        })
}

fn project(id: &str, budget: f64) -> Project {
    Project {
        id: id.to_string(),
        name: id.to_string(),
        location: String::new(),
        description: String::new(),
        status: ProjectStatus::Active,
        budget,
        client: Some(EntityRef::new("c1")),
        manager: None,
        start_date: None,
        end_date: None,
    }
}

fn user(id: &str) -> User {
    User {
        id: id.to_string(),
        name: id.to_string(),
        email: String::new(),
        role: Role::Worker,
        is_active: true,
        phone: String::new(),
    }
}

fn income(amount: f64, project: &str) -> FinancialRecord {
    FinancialRecord {
        id: String::new(),
        record_type: TransactionType::Income,
        category: "Billing".to_string(),
        amount,
        project: Some(EntityRef::new(project)),
        description: String::new(),
        date: None,
    }
}

proptest! {
    #[test]
    fn status_counts_partition_tasks(tasks in prop::collection::vec(task(), 0..40)) {
        let total: usize = TaskStatus::ALL
            .iter()
            .map(|&s| count_by_status(&tasks, s))
            .sum();
        prop_assert_eq!(total, tasks.len());
    }

    #[test]
    fn progress_is_zero_without_referencing_tasks(tasks in prop::collection::vec(task(), 0..40)) {
        let orphan = project("p-none", 0.0);
        prop_assert_eq!(project_progress(&orphan, &tasks), 0);
    }

    #[test]
    fn progress_stays_within_bounds(tasks in prop::collection::vec(task(), 0..40)) {
        for id in PROJECT_IDS {
            prop_assert!(project_progress(&project(id, 0.0), &tasks) <= 100);
        }
    }

    #[test]
    fn pending_payment_is_never_negative(
        budgets in prop::collection::vec(0.0f64..1e7, 0..3),
        payments in prop::collection::vec((0.0f64..1e7, 0usize..3), 0..10),
    ) {
        let client = Client {
            id: "c1".to_string(),
            name: "Acme".to_string(),
            company: String::new(),
            email: String::new(),
            phone: String::new(),
            address: String::new(),
            is_active: true,
        };
        let projects: Vec<Project> = budgets
            .iter()
            .enumerate()
            .map(|(i, &b)| project(PROJECT_IDS[i], b))
            .collect();
        let records: Vec<FinancialRecord> = payments
            .iter()
            .map(|&(amount, i)| income(amount, PROJECT_IDS[i]))
            .collect();

        let financials = client_financials(&client, &projects, &records);
        prop_assert!(financials.pending_payment >= 0.0);
        prop_assert!(financials.revenue >= 0.0);
    }

    #[test]
    fn breakdown_parts_never_exceed_assigned(tasks in prop::collection::vec(task(), 0..40)) {
        for id in USER_IDS {
            let b = user_task_breakdown(&user(id), &tasks);
            prop_assert!(b.completed + b.pending <= b.assigned);
        }
    }

    #[test]
    fn views_preserve_length_and_order(tasks in prop::collection::vec(task(), 0..40)) {
        let snapshot = Snapshot {
            users: USER_IDS.iter().map(|id| user(id)).collect(),
            projects: PROJECT_IDS.iter().map(|id| project(id, 100.0)).collect(),
            tasks: tasks.clone(),
            ..Snapshot::default()
        };

        let task_views = build_task_views(&tasks, &snapshot);
        prop_assert_eq!(task_views.len(), tasks.len());
        for (view, task) in task_views.iter().zip(&tasks) {
            prop_assert_eq!(&view.task, task);
        }

        let project_views = build_project_views(&snapshot.projects, &snapshot);
        let ids: Vec<&str> = project_views.iter().map(|v| v.project.id.as_str()).collect();
        prop_assert_eq!(ids, PROJECT_IDS.to_vec());

        let user_views = build_user_views(&snapshot.users, &snapshot);
        prop_assert_eq!(user_views.len(), USER_IDS.len());
    }
}

#[test]
fn known_progress_and_breakdown_values() {
    let t = |status, project: &str, user: &str| Task {
        id: String::new(),
        title: String::new(),
        description: String::new(),
        status,
        priority: TaskPriority::Low,
        project: Some(EntityRef::new(project)),
        assigned_to: Some(EntityRef::new(user)),
        due_date: None,
    };

    let tasks = vec![
        t(TaskStatus::Completed, "p1", "u1"),
        t(TaskStatus::Pending, "p1", "u1"),
    ];
    assert_eq!(project_progress(&project("p1", 0.0), &tasks), 50);

    let tasks = vec![
        t(TaskStatus::Completed, "p1", "u1"),
        t(TaskStatus::Completed, "p2", "u1"),
        t(TaskStatus::Pending, "p2", "u1"),
    ];
    let b = user_task_breakdown(&user("u1"), &tasks);
    assert_eq!((b.assigned, b.completed, b.pending), (3, 2, 1));

    let client = Client {
        id: "c1".to_string(),
        name: String::new(),
        company: String::new(),
        email: String::new(),
        phone: String::new(),
        address: String::new(),
        is_active: true,
    };
    let projects = vec![project("p1", 1000.0), project("p2", 2000.0)];
    let f = client_financials(&client, &projects, &[]);
    assert!(f.revenue.abs() < f64::EPSILON);
    assert!((f.pending_payment - 3000.0).abs() < f64::EPSILON);
}
