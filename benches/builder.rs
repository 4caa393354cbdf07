use changeset_graph::{BuildOptions, ChangeSet, InMemoryProvider, StackGraphBuilder, to_dot};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

fn resource_change(logical_id: &str, index: usize, params: usize) -> String {
    let mut details = Vec::new();
    if index > 0 {
        details.push(format!(
            r#"{{"Target": {{"Attribute": "Properties", "Name": "Ref{index}"}}, "Evaluation": "Static", "ChangeSource": "ResourceReference", "CausingEntity": "R{}"}}"#,
            index - 1
        ));
    }
    if params > 0 {
        details.push(format!(
            r#"{{"Target": {{"Attribute": "Properties", "Name": "Env"}}, "Evaluation": "Static", "ChangeSource": "ParameterReference", "CausingEntity": "P{}"}}"#,
            index % params
        ));
        details.push(
            r#"{"Target": {"Attribute": "Properties", "Name": "Env"}, "Evaluation": "Dynamic", "ChangeSource": "DirectModification"}"#
                .to_string(),
        );
    }
    format!(
        r#"{{"Type": "Resource", "ResourceChange": {{"Action": "Modify", "LogicalResourceId": "{logical_id}", "ResourceType": "AWS::Lambda::Function", "Replacement": "False", "Details": [{}]}}}}"#,
        details.join(",")
    )
}

fn stack_source(
    stack: &str,
    change_set: &str,
    resources: usize,
    params: usize,
    nested: &[(String, String)],
) -> String {
    let mut changes: Vec<String> = (0..resources)
        .map(|i| resource_change(&format!("R{i}"), i, params))
        .collect();
    for (idx, (logical_id, nested_change_set)) in nested.iter().enumerate() {
        changes.push(format!(
            r#"{{"Type": "Resource", "ResourceChange": {{"Action": "Modify", "LogicalResourceId": "{logical_id}", "ResourceType": "AWS::CloudFormation::Stack",
                "ChangeSetId": "arn:aws:cloudformation:us-east-1:123456789012:changeSet/{nested_change_set}/{idx}",
                "Details": [{{"Target": {{"Attribute": "Properties", "Name": "Parameters"}}, "Evaluation": "Static", "ChangeSource": "ParameterReference", "CausingEntity": "P0"}}]}}}}"#
        ));
    }
    format!(
        r#"{{"StackName": "{stack}", "ChangeSetName": "{change_set}", "Changes": [{}]}}"#,
        changes.join(",")
    )
}

/// Root stack with `nested` nested stacks, each with `resources` resources.
fn synthetic_provider(nested: usize, resources: usize) -> InMemoryProvider {
    let children: Vec<(String, String)> = (0..nested)
        .map(|i| (format!("Nested{i}"), format!("nested-cs-{i}")))
        .collect();
    let root = stack_source("app", "root-cs", resources, 4, &children);
    let mut provider = InMemoryProvider::new();
    provider.insert("root-cs", ChangeSet::from_json(&root).expect("parse failed"));
    for (i, (_, change_set)) in children.iter().enumerate() {
        let source = stack_source(&format!("app-Nested{i}-X"), change_set, resources, 4, &[]);
        provider.insert(change_set.clone(), ChangeSet::from_json(&source).expect("parse failed"));
    }
    provider
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build");
    for (nested, resources) in [(0usize, 20usize), (4, 50), (16, 100)] {
        let provider = synthetic_provider(nested, resources);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("nested_{nested}_resources_{resources}")),
            &provider,
            |b, provider| {
                b.iter(|| {
                    let options = BuildOptions::default();
                    let provider = black_box(provider);
                    let model = StackGraphBuilder::build(provider, Some("app"), "root-cs", options)
                        .expect("build failed");
                    black_box(model.edge_count());
                });
            },
        );
    }
    group.finish();
}

fn bench_to_dot(c: &mut Criterion) {
    let mut group = c.benchmark_group("to_dot");
    for (nested, resources) in [(4usize, 50usize), (16, 100)] {
        let provider = synthetic_provider(nested, resources);
        let options = BuildOptions::default();
        let model = StackGraphBuilder::build(&provider, Some("app"), "root-cs", options)
            .expect("build failed");
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("nested_{nested}_resources_{resources}")),
            &model,
            |b, model| {
                b.iter(|| black_box(to_dot(black_box(model)).len()));
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_build, bench_to_dot);
criterion_main!(benches);
