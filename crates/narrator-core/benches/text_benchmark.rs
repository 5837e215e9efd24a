use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use narrator_core::{clean_text, split_sentences, Language, Voice, VoiceGender, VoiceSelector};

fn bench_clean_text(c: &mut Criterion) {
    let mut group = c.benchmark_group("clean_text");

    let long_markdown = "## Resumen\n- **Ingresos:** $1,200 💰\n- Gastos: [ver detalle](https://evofinz.app/g). ".repeat(20);
    let test_texts = vec![
        ("plain", "Hello world! This is a test. Done?".to_string()),
        ("markdown", "**Important:** see [this link](http://x) for `code`. 🎉".to_string()),
        ("long_markdown", long_markdown),
    ];

    for (name, text) in &test_texts {
        group.bench_with_input(BenchmarkId::new("clean", name), text, |b, text| {
            b.iter(|| black_box(clean_text(black_box(text))));
        });
    }

    group.finish();
}

fn bench_split_sentences(c: &mut Criterion) {
    let mut group = c.benchmark_group("split_sentences");

    let text = clean_text(&"Gastaste menos este mes. ¡Bien hecho! ¿Quieres ver el detalle? ".repeat(50));
    group.bench_function("split_150", |b| {
        b.iter(|| black_box(split_sentences(black_box(&text))));
    });

    group.finish();
}

fn bench_voice_selection(c: &mut Criterion) {
    let mut group = c.benchmark_group("voice_selection");

    let voices: Vec<Voice> = (0..60)
        .map(|i| {
            let lang = ["fr-FR", "en-GB", "es-ES", "es-MX"][i % 4];
            Voice::new(format!("Voice {i}"), lang)
        })
        .chain(std::iter::once(Voice::new("Paulina", "es-MX")))
        .collect();

    for gender in [VoiceGender::Auto, VoiceGender::Female, VoiceGender::Male] {
        let selector = VoiceSelector::new(None, gender, Language::Es);
        group.bench_with_input(BenchmarkId::new("select", gender), &selector, |b, selector| {
            b.iter(|| black_box(selector.select(black_box(&voices))));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_clean_text, bench_split_sentences, bench_voice_selection);
criterion_main!(benches);
