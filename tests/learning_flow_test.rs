use chrono::Utc;
use learnpath_backend::error::Error;
use learnpath_backend::models::course::{
    level_for_score, Course, ModuleStatus, MODULES_PER_COURSE,
};
use learnpath_backend::services::ai_service::parse_json_payload;
use learnpath_backend::services::assessment_service::parse_questions;
use learnpath_backend::services::course_service::{plan_completion, CompletionPlan, CourseService};
use learnpath_backend::services::curriculum_service::parse_roadmap;
use learnpath_backend::services::grading_service::GradingService;
use serde_json::json;
use uuid::Uuid;

/// The quiz payload a well-behaved oracle returns for "Linear Algebra",
/// wrapped in a markdown fence the way generation models like to.
fn stub_quiz_reply() -> String {
    let questions: Vec<serde_json::Value> = (1..=5)
        .map(|i| {
            json!({
                "question": format!("Linear algebra question {}?", i),
                "options": [
                    format!("Wrong A{}", i),
                    format!("Right {}", i),
                    format!("Wrong B{}", i),
                    format!("Wrong C{}", i)
                ],
                "correct_answer": format!("Right {}", i)
            })
        })
        .collect();
    format!(
        "```json\n{}\n```",
        json!({ "questions": questions })
    )
}

fn stub_roadmap_reply(module_count: usize) -> serde_json::Value {
    let modules: Vec<serde_json::Value> = (1..=module_count)
        .map(|i| {
            json!({
                "title": format!("Module {}", i),
                "description": "Targets the identified weaknesses before broadening out.",
                "order": i
            })
        })
        .collect();
    json!({ "modules": modules })
}

fn apply(plan: CompletionPlan, course: &mut Course) {
    course.roadmap = serde_json::to_value(&plan.modules).unwrap();
    course.current_module_index = plan.new_index;
    course.progress = plan.progress;
}

#[test]
fn diagnostic_to_completed_course_workflow() {
    // Quiz generation: 5 questions, fenced JSON accepted.
    let payload = parse_json_payload(&stub_quiz_reply()).expect("quiz JSON parses");
    let mut questions = parse_questions(&payload).expect("quiz validates");
    assert_eq!(questions.len(), 5);

    // Grading: one wrong answer out of five.
    let answers: Vec<String> = vec![
        "Right 1".into(),
        "Right 2".into(),
        "Wrong A3".into(),
        "Right 4".into(),
        "Right 5".into(),
    ];
    let outcome = GradingService::grade(&mut questions, &answers);
    assert_eq!(outcome.score, 80);
    assert_eq!(outcome.wrong_answers.len(), 1);

    // Planning: 80 >= 70 is an advanced course with exactly 6 modules.
    let level = level_for_score(outcome.score);
    assert_eq!(level, "advanced");
    let modules =
        parse_roadmap(&stub_roadmap_reply(MODULES_PER_COURSE)).expect("roadmap validates");

    let mut course = Course {
        id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
        assessment_id: None,
        topic: "Linear Algebra".into(),
        level: level.into(),
        roadmap: serde_json::to_value(&modules).unwrap(),
        progress: 0,
        weaknesses: json!(["matrix inverses"]),
        assessment_score: outcome.score,
        current_module_index: 0,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    // Fresh course: module 1 active, 2-6 locked.
    let statuses: Vec<ModuleStatus> = course
        .modules()
        .iter()
        .map(|m| course.status_of(m))
        .collect();
    assert_eq!(statuses[0], ModuleStatus::Active);
    assert!(statuses[1..].iter().all(|s| *s == ModuleStatus::Locked));

    // Completing module 1 moves the pointer and unlocks module 2.
    let plan = plan_completion(&course, 1, Utc::now()).unwrap();
    assert_eq!(plan.new_index, 1);
    assert_eq!(plan.progress, 17);
    apply(plan, &mut course);

    let modules_now = course.modules();
    assert!(modules_now[0].completed_at.is_some());
    assert_eq!(course.status_of(&modules_now[0]), ModuleStatus::Completed);
    assert_eq!(course.status_of(&modules_now[1]), ModuleStatus::Active);
    assert_eq!(course.status_of(&modules_now[2]), ModuleStatus::Locked);

    // Complete the rest sequentially; exactly one active module throughout.
    for module_id in 2..=6 {
        let active_count = course
            .modules()
            .iter()
            .filter(|m| course.status_of(m) == ModuleStatus::Active)
            .count();
        assert_eq!(active_count, 1);

        let plan = plan_completion(&course, module_id, Utc::now()).unwrap();
        apply(plan, &mut course);
    }

    assert_eq!(course.current_module_index, 6);
    assert_eq!(course.progress, 100);
    assert!(course.is_finished());
    let finished = course.modules();
    assert!(finished
        .iter()
        .all(|m| course.status_of(m) == ModuleStatus::Completed));
    assert!(finished.iter().all(|m| m.completed_at.is_some()));

    // A seventh completion attempt is a state-machine violation.
    let err = plan_completion(&course, 6, Utc::now()).unwrap_err();
    assert!(matches!(err, Error::InvalidState(_)));
}

#[test]
fn out_of_order_completion_is_rejected() {
    let modules = parse_roadmap(&stub_roadmap_reply(MODULES_PER_COURSE)).unwrap();
    let course = Course {
        id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
        assessment_id: None,
        topic: "Linear Algebra".into(),
        level: "beginner".into(),
        roadmap: serde_json::to_value(&modules).unwrap(),
        progress: 0,
        weaknesses: json!([]),
        assessment_score: 20,
        current_module_index: 0,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    // Jumping ahead to a locked module fails both at selection and at
    // completion, so the UI gate and the state machine agree.
    assert!(matches!(
        CourseService::select_module(&course, 4),
        Err(Error::InvalidState(_))
    ));
    assert!(matches!(
        plan_completion(&course, 4, Utc::now()),
        Err(Error::InvalidState(_))
    ));
}

#[test]
fn short_roadmap_from_the_oracle_is_fatal() {
    let err = parse_roadmap(&stub_roadmap_reply(5)).unwrap_err();
    assert!(matches!(err, Error::AiCurriculum(_)));

    let err = parse_roadmap(&stub_roadmap_reply(7)).unwrap_err();
    assert!(matches!(err, Error::AiCurriculum(_)));
}

#[test]
fn quiz_with_wrong_shape_is_fatal() {
    // Four questions instead of five.
    let payload = parse_json_payload(
        &json!({
            "questions": (1..=4).map(|i| json!({
                "question": format!("Q{}?", i),
                "options": ["A", "B", "C", "D"],
                "correct_answer": "A"
            })).collect::<Vec<_>>()
        })
        .to_string(),
    )
    .unwrap();
    assert!(matches!(
        parse_questions(&payload),
        Err(Error::AiFormat(_))
    ));
}
