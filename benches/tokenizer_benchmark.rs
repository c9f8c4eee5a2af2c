// Tokenization and Vectorization Benchmarks
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use disaster_response_pipeline::config::NlpConfig;
use disaster_response_pipeline::ml::{FeatureComposer, FeatureSettings, TextVectorizer, Transformer};
use disaster_response_pipeline::nlp::{self, Tokenizer};

const SAMPLES: [&str; 6] = [
    "We need water and food in the village, the children are hungry.",
    "RT Please help! The bridge collapsed http://bit.ly/abc123 after the flood.",
    "Is the Hurricane over or is it not over",
    "There's nothing to eat and water, we starving and thirsty.",
    "UN reports Leogane 80-90 destroyed. Only Hospital St. Croix functioning.",
    "Looking for someone but no name",
];

fn corpus(size: usize) -> Vec<String> {
    SAMPLES
        .iter()
        .cycle()
        .take(size)
        .enumerate()
        .map(|(i, text)| format!("{} report {}", text, i))
        .collect()
}

fn tokenize_single(c: &mut Criterion) {
    let resources = nlp::init(&NlpConfig::default()).unwrap();
    let tokenizer = Tokenizer::new(resources, "urlplaceholder").unwrap();

    c.bench_function("tokenize_message_with_url", |b| {
        b.iter(|| tokenizer.tokenize(black_box(SAMPLES[1])));
    });
}

fn vectorizer_fit(c: &mut Criterion) {
    let resources = nlp::init(&NlpConfig::default()).unwrap();
    let tokenizer = Tokenizer::new(resources, "urlplaceholder").unwrap();
    let vectorizer = TextVectorizer::new(tokenizer, true);
    let mut group = c.benchmark_group("vectorizer_fit");

    for size in [100usize, 1000].iter() {
        let messages = corpus(*size);
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &messages, |b, messages| {
            b.iter(|| vectorizer.fit(black_box(messages)).unwrap());
        });
    }
    group.finish();
}

fn composed_transform(c: &mut Criterion) {
    let resources = nlp::init(&NlpConfig::default()).unwrap();
    let composer = FeatureComposer::new(resources, &FeatureSettings::default()).unwrap();
    let messages = corpus(500);
    let state = composer.fit(&messages).unwrap();

    c.bench_function("feature_composer_transform_500", |b| {
        b.iter(|| composer.transform(black_box(&messages), &state).unwrap());
    });
}

criterion_group!(benches, tokenize_single, vectorizer_fit, composed_transform);
criterion_main!(benches);
