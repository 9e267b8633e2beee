// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! End-to-end dashboard flows against the in-process services

use credilink::dashboard::{MSG_CHECK_FAILED, MSG_EMPTY_URL, MSG_NO_FILE};
use credilink::{
    CsvUpload, DatasetTesterView, LocalModelService, ManualInputForm, ModelComparison, ModelType, ServiceConfig,
    UrlChecker, Verdict,
};
use std::io::Write;

fn service() -> LocalModelService {
    LocalModelService::new(ServiceConfig {
        reference_size: 400,
        ..ServiceConfig::default()
    })
}

#[tokio::test]
async fn url_check_produces_full_report() {
    let svc = service();
    let mut view = UrlChecker::new();
    view.set_input("https://www.instagram.com/nasa/?hl=en");
    view.submit(&svc, &svc).await;

    let report = view.report.as_ref().expect("report");
    assert!(view.error.is_none());
    assert!(report.scraped_data.final_credibility_score <= 95);
    assert!((0.0..=1.0).contains(&report.prediction.confidence));
    assert_eq!(report.breakdown().len(), 11);

    // same handle, different spelling
    let mut again = UrlChecker::new();
    again.set_input("@nasa");
    again.submit(&svc, &svc).await;
    assert_eq!(again.report, view.report);
}

#[tokio::test]
async fn url_check_edge_cases() {
    let svc = service();

    let mut empty = UrlChecker::new();
    empty.submit(&svc, &svc).await;
    assert_eq!(empty.error.as_deref(), Some(MSG_EMPTY_URL));

    let mut invalid = UrlChecker::new();
    invalid.set_input("https://instagram.com/");
    invalid.submit(&svc, &svc).await;
    assert_eq!(invalid.error.as_deref(), Some(MSG_CHECK_FAILED));
    assert!(invalid.report.is_none());
}

#[tokio::test]
async fn manual_defaults_with_linear_svc() {
    let svc = service();
    let mut form = ManualInputForm::new();
    form.submit(&svc).await;

    let prediction = form.prediction.expect("prediction");
    assert!(matches!(prediction.result, Verdict::Real | Verdict::Fake));
    assert!((0.0..=1.0).contains(&prediction.confidence));
    assert!(form.render().contains("Prediction Result"));
}

#[tokio::test]
async fn dataset_file_round_trip() {
    let svc = service();

    let mut view = DatasetTesterView::new();
    view.submit(&svc).await;
    assert_eq!(view.error.as_deref(), Some(MSG_NO_FILE));

    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "profilePic,numsLengthUsername,fullnameWords,numsLengthFullname,nameEqualsUsername,descriptionLength,externalURL,private,posts,followers,follows,label"
    )
    .unwrap();
    writeln!(file, "1,0,2,0,0,120,1,0,420,2300,310,real").unwrap();
    writeln!(file, "1,0.1,3,0,0,64,0,1,95,870,400,real").unwrap();
    writeln!(file, "0,0.6,0,0,1,0,0,0,0,6,2900,fake").unwrap();
    writeln!(file, "0,0.44,1,0,0,0,0,0,2,15,5200,fake").unwrap();

    view.select_file(CsvUpload::from_path(file.path()).unwrap());
    view.set_model(ModelType::Knn);
    view.submit(&svc).await;

    let results = view.results.expect("results");
    assert_eq!(results.confusion_matrix.total(), 4);
    assert!(results.accuracy >= 0.75);
}

#[tokio::test]
async fn comparison_lists_every_model() {
    let svc = service();
    let mut view = ModelComparison::new();
    view.mount(&svc).await;

    let groups = view.bar_groups();
    let models: Vec<_> = groups.iter().map(|g| g.model).collect();
    assert_eq!(models, ModelType::ALL.to_vec());
    assert!(groups.iter().all(|g| g.bars.len() == 4));
    assert!(view.render().contains("LinearSVC"));
}
