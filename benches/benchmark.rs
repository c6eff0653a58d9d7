use criterion::{Criterion, criterion_group, criterion_main};
use loan_debugger::training::{self, TrainingConfig, TrainingData};
use loan_debugger::{PredictionService, RawInput, TreeEnsembleParams, normalize};

fn synthetic_csv(rows: usize) -> String {
    let mut csv = String::from(
        "loan_id,gender,married,dependents,education,self_employed,applicant_income,\
         coapplicant_income,loan_amount,loan_amount_term,credit_history,property_area,loan_status\n",
    );
    let areas = ["Urban", "Semiurban", "Rural"];
    for i in 0..rows {
        let credit = i % 4 != 0;
        csv.push_str(&format!(
            "LP{i},{},{},{},{},{},{},{},{},360,{},{},{}\n",
            if i % 2 == 0 { "Male" } else { "Female" },
            if i % 3 == 0 { "No" } else { "Yes" },
            i % 4,
            if i % 5 == 0 { "Not Graduate" } else { "Graduate" },
            if i % 7 == 0 { "Yes" } else { "No" },
            2000 + (i * 37) % 8000,
            (i * 13) % 3000,
            80 + (i * 11) % 200,
            u8::from(credit),
            areas[i % 3],
            if credit { "Y" } else { "N" },
        ));
    }
    csv
}

fn applicant() -> RawInput {
    RawInput::new()
        .with("gender", "Male")
        .with("married", "Yes")
        .with("dependents", "0")
        .with("education", "Graduate")
        .with("self_employed", "No")
        .with("applicant_income", 5000.0)
        .with("coapplicant_income", 0.0)
        .with("loan_amount", 100.0)
        .with("loan_amount_term", "360")
        .with("credit_history", "1")
        .with("property_area", "Urban")
}

fn service() -> PredictionService {
    let data = TrainingData::from_reader(synthetic_csv(500).as_bytes()).unwrap();
    let config = TrainingConfig {
        ensemble: TreeEnsembleParams {
            n_estimators: 25,
            ..TreeEnsembleParams::default()
        },
        ..TrainingConfig::default()
    };
    let trained = training::train(&data, config).unwrap();
    PredictionService::new(Some(Box::new(trained.model)), trained.encoders)
}

fn bench_normalize(c: &mut Criterion) {
    let service = service();
    let raw = applicant();

    c.bench_function("normalize applicant", |b| {
        b.iter(|| {
            let _ = normalize(&raw, service.encoders(), service.schema());
        })
    });
}

fn bench_predict(c: &mut Criterion) {
    let service = service();
    let raw = applicant();

    c.bench_function("predict applicant", |b| {
        b.iter(|| {
            let _ = service.predict_loan_status(&raw);
        })
    });
}

criterion_group!(benches, bench_normalize, bench_predict);
criterion_main!(benches);
