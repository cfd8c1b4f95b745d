mod support;

use std::collections::HashMap;
use std::sync::Arc;

use auto_job_apply::infrastructure::{locate_first, AutomationTarget};
use auto_job_apply::models::{ApplicationRequest, Profile, QuestionKind};
use auto_job_apply::workflow::form_reader::analyze_form;
use auto_job_apply::workflow::job_flow::NO_CONFIRMATION_WARNING;
use auto_job_apply::workflow::ApplyFlow;

use support::{
    fast_settings, job_id_from_url, render_form, render_job_page, test_selectors, FakePage,
    FormScript, ScriptedGenerator, RELOCATE_QUESTION, REMOTE_QUESTION, YEARS_QUESTION,
};

fn job_site(scripts: HashMap<&'static str, FormScript>) -> Arc<FakePage> {
    let page = Arc::new(FakePage::new());
    page.on_navigate(move |dom, url| {
        if let Some(id) = job_id_from_url(url) {
            let script = scripts.get(id.as_str()).copied().unwrap_or_default();
            render_job_page(dom, script);
        }
    });
    page
}

fn request(id: &str) -> ApplicationRequest {
    ApplicationRequest {
        job_id: id.to_string(),
        monthly_compensation: 7000,
    }
}

#[tokio::test]
async fn test_apply_fills_and_submits_form() {
    let page = job_site(HashMap::new());
    let generator = Arc::new(ScriptedGenerator::complete());
    let flow = ApplyFlow::new(test_selectors().apply, fast_settings(), generator.clone());

    let target: Arc<dyn AutomationTarget> = page.clone();
    let results = flow.apply(&[request("101")], &Profile::default(), target).await;

    assert_eq!(results.len(), 1);
    let result = &results[0];
    assert!(result.success);
    assert_eq!(result.last_step, "application_submitted");
    assert_eq!(result.warning, None);
    assert_eq!(result.answers.get(YEARS_QUESTION).map(String::as_str), Some("5"));
    assert_eq!(result.answers.get(RELOCATE_QUESTION).map(String::as_str), Some("No"));
    assert_eq!(result.answers.get(REMOTE_QUESTION).map(String::as_str), Some("Yes"));

    assert_eq!(
        page.clicks(),
        vec!["easy_apply", "relocate_no", "remote_yes", "submit"]
    );
    assert!(page.events().contains(&"type:years=5".to_string()));
    assert!(generator.calls().iter().all(|(_, pay)| *pay == 7000));
}

#[tokio::test]
async fn test_apply_button_found_by_later_locator() {
    let mut scripts = HashMap::new();
    scripts.insert(
        "101",
        FormScript {
            apply_button: ".jobs-apply-button--top-card button",
            ..FormScript::default()
        },
    );
    let page = job_site(scripts);
    let selectors = test_selectors().apply;

    page.navigate("https://site.test/jobs/view/101/").await.unwrap();
    let (index, _) = locate_first(page.as_ref(), &selectors.open_form)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(index, 2);

    let flow = ApplyFlow::new(
        selectors,
        fast_settings(),
        Arc::new(ScriptedGenerator::complete()),
    );
    let target: Arc<dyn AutomationTarget> = page.clone();
    let results = flow.apply(&[request("101")], &Profile::default(), target).await;

    assert!(results[0].success);
    assert_eq!(results[0].last_step, "application_submitted");
    assert_eq!(page.clicks().first().map(String::as_str), Some("easy_apply"));
}

#[tokio::test]
async fn test_submit_button_found_by_later_locator() {
    let mut scripts = HashMap::new();
    scripts.insert(
        "101",
        FormScript {
            submit_button: "button.artdeco-button--primary",
            ..FormScript::default()
        },
    );
    let page = job_site(scripts);
    let flow = ApplyFlow::new(
        test_selectors().apply,
        fast_settings(),
        Arc::new(ScriptedGenerator::complete()),
    );

    let target: Arc<dyn AutomationTarget> = page.clone();
    let results = flow.apply(&[request("101")], &Profile::default(), target).await;

    assert!(results[0].success);
    assert_eq!(results[0].warning, None);
    assert_eq!(page.clicks().last().map(String::as_str), Some("submit"));
}

#[tokio::test]
async fn test_result_count_matches_request_count() {
    let mut scripts = HashMap::new();
    scripts.insert(
        "202",
        FormScript {
            has_apply_button: false,
            ..FormScript::default()
        },
    );
    let page = job_site(scripts);
    let generator = Arc::new(ScriptedGenerator::complete());
    let flow = ApplyFlow::new(test_selectors().apply, fast_settings(), generator);

    let requests = vec![request("101"), request("202"), request("303")];
    let target: Arc<dyn AutomationTarget> = page;
    let results = flow.apply(&requests, &Profile::default(), target).await;

    assert_eq!(results.len(), 3);
    let ids: Vec<_> = results.iter().map(|r| r.job_id.as_str()).collect();
    assert_eq!(ids, vec!["101", "202", "303"]);

    assert!(results[0].success);
    assert!(!results[1].success);
    assert_eq!(results[1].last_step, "apply_button_not_found");
    assert!(results[1].error.is_some());
    assert!(results[2].success);
}

#[tokio::test]
async fn test_empty_request_list_yields_no_results() {
    let page = job_site(HashMap::new());
    let flow = ApplyFlow::new(
        test_selectors().apply,
        fast_settings(),
        Arc::new(ScriptedGenerator::complete()),
    );

    let target: Arc<dyn AutomationTarget> = page.clone();
    let results = flow.apply(&[], &Profile::default(), target).await;

    assert!(results.is_empty());
    assert!(page.events().is_empty());
}

#[tokio::test]
async fn test_missing_confirmation_is_success_with_warning() {
    let mut scripts = HashMap::new();
    scripts.insert(
        "101",
        FormScript {
            confirms: false,
            ..FormScript::default()
        },
    );
    let page = job_site(scripts);
    let flow = ApplyFlow::new(
        test_selectors().apply,
        fast_settings(),
        Arc::new(ScriptedGenerator::complete()),
    );

    let target: Arc<dyn AutomationTarget> = page;
    let results = flow.apply(&[request("101")], &Profile::default(), target).await;

    assert!(results[0].success);
    assert_eq!(results[0].warning.as_deref(), Some(NO_CONFIRMATION_WARNING));
    assert_eq!(results[0].last_step, "application_submitted_no_confirmation");
}

#[tokio::test]
async fn test_failed_answer_is_recorded_and_form_still_submitted() {
    let page = job_site(HashMap::new());
    // 文本题没有答案
    let generator = Arc::new(ScriptedGenerator::new(&[
        (RELOCATE_QUESTION, "Yes"),
        (REMOTE_QUESTION, "No"),
    ]));
    let flow = ApplyFlow::new(test_selectors().apply, fast_settings(), generator);

    let target: Arc<dyn AutomationTarget> = page.clone();
    let results = flow.apply(&[request("101")], &Profile::default(), target).await;

    let result = &results[0];
    assert!(result.success);
    assert!(result.answers[YEARS_QUESTION].starts_with("Error: "));
    assert_eq!(result.answers[RELOCATE_QUESTION], "Yes");
    assert_eq!(result.answers[REMOTE_QUESTION], "No");
    assert!(!page.events().iter().any(|e| e.starts_with("type:years=")));
}

#[tokio::test]
async fn test_fallback_answer_replaces_failed_generation() {
    let page = job_site(HashMap::new());
    let mut settings = fast_settings();
    settings.fallback_answer = Some("3".to_string());
    let flow = ApplyFlow::new(
        test_selectors().apply,
        settings,
        Arc::new(ScriptedGenerator::new(&[])),
    );

    let target: Arc<dyn AutomationTarget> = page.clone();
    let results = flow.apply(&[request("101")], &Profile::default(), target).await;

    let result = &results[0];
    assert_eq!(result.answers[YEARS_QUESTION], "3");
    // 默认答案与选项都不匹配时取第一个选项
    assert_eq!(result.answers[RELOCATE_QUESTION], "Yes");
    assert!(page.events().contains(&"type:years=3".to_string()));
}

#[tokio::test]
async fn test_analyze_form_reads_all_question_kinds() {
    let page = FakePage::new();
    page.with_dom(|dom| render_form(dom, FormScript::default()));
    let selectors = test_selectors().apply;

    let questions = analyze_form(&page, &selectors).await.unwrap();

    let summary: Vec<_> = questions
        .iter()
        .map(|q| (q.prompt.as_str(), q.kind, q.options.clone()))
        .collect();
    assert_eq!(
        summary,
        vec![
            (YEARS_QUESTION, QuestionKind::FreeText, vec![]),
            (
                RELOCATE_QUESTION,
                QuestionKind::SingleSelect,
                vec!["Yes".to_string(), "No".to_string()]
            ),
            (
                REMOTE_QUESTION,
                QuestionKind::RadioGroup,
                vec!["Yes".to_string(), "No".to_string()]
            ),
        ]
    );
    for question in &questions {
        assert_eq!(question.options.len(), question.choices.len());
    }
}

#[tokio::test]
async fn test_analyze_form_is_idempotent() {
    let page = FakePage::new();
    page.with_dom(|dom| render_form(dom, FormScript::default()));
    let selectors = test_selectors().apply;

    let first = analyze_form(&page, &selectors).await.unwrap();
    let second = analyze_form(&page, &selectors).await.unwrap();

    assert_eq!(first, second);
    assert!(page.events().is_empty());
}
