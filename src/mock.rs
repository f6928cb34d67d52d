use crate::models::{ClassifierResults, Dataset, DatasetDetails, GeneExpression};

/// The six genes every search and demo view knows about.
pub const QUICK_ACCESS_GENES: [&str; 6] = ["BRCA1", "TP53", "ESR1", "HER2", "MYC", "PTEN"];

fn gene(
    symbol: &str,
    name: &str,
    log_fc: f64,
    p_value: f64,
    adj_p_value: f64,
    expression: [f64; 5],
    description: &str,
) -> GeneExpression {
    GeneExpression {
        symbol: symbol.to_string(),
        name: name.to_string(),
        log_fc,
        p_value,
        adj_p_value,
        expression: vec![expression.to_vec()],
        description: Some(description.to_string()),
    }
}

pub fn top_genes() -> Vec<GeneExpression> {
    vec![
        gene(
            "BRCA1",
            "Breast Cancer Gene 1",
            2.45,
            0.001,
            0.012,
            [2.1, 2.3, 1.8, 2.5, 2.0],
            "This gene helps repair DNA damage. When it changes, cancer risk increases.",
        ),
        gene(
            "TP53",
            "Tumor Suppressor Gene",
            -1.89,
            0.003,
            0.024,
            [1.2, 1.5, 1.1, 1.8, 1.3],
            "Known as the \"guardian of the genome\" - it stops cells from becoming cancerous.",
        ),
        gene(
            "ESR1",
            "Estrogen Receptor",
            3.21,
            0.000,
            0.008,
            [3.2, 3.5, 2.9, 3.8, 3.1],
            "Responds to estrogen hormone. Important in breast cancer treatment decisions.",
        ),
        gene(
            "HER2",
            "Growth Factor Receptor",
            1.67,
            0.007,
            0.045,
            [1.7, 1.9, 1.5, 2.1, 1.6],
            "Controls cell growth. When overactive, it can cause aggressive cancer.",
        ),
        gene(
            "MYC",
            "Cell Division Controller",
            -2.14,
            0.002,
            0.018,
            [0.8, 0.9, 0.7, 1.1, 0.9],
            "Regulates how fast cells divide. Changes can lead to uncontrolled growth.",
        ),
        gene(
            "PTEN",
            "Tumor Suppressor",
            1.92,
            0.005,
            0.032,
            [1.9, 2.1, 1.7, 2.3, 1.8],
            "Acts like a brake pedal for cell growth, preventing tumor formation.",
        ),
    ]
}

pub fn classifier_results() -> ClassifierResults {
    ClassifierResults {
        accuracy: 0.87,
        precision: 0.84,
        recall: 0.89,
        f1_score: 0.86,
        confusion_matrix: [[45, 7], [6, 42]],
        roc_data: None,
        explanation: Some(
            "The classifier predicted the health status correctly 87% of the time from gene \
             patterns."
                .to_string(),
        ),
    }
}

/// The curated studies offered on the home screen.
pub fn datasets() -> Vec<Dataset> {
    const ORGANISM: &str = "Homo sapiens";
    vec![
        Dataset::new("GSE42872", "Breast Cancer Expression", 104, ORGANISM),
        Dataset::new("GSE2034", "Breast Cancer Outcome", 286, ORGANISM),
        Dataset::new("GSE7305", "Lung Cancer Analysis", 122, ORGANISM),
        Dataset::new("GSE33126", "Prostate Cancer Study", 98, ORGANISM),
        Dataset::new("GSE19804", "Colorectal Cancer", 156, ORGANISM),
        Dataset::new("GSE6344", "Leukemia Expression", 89, ORGANISM),
        Dataset::new("GSE10072", "Liver Cancer Dataset", 145, ORGANISM),
        Dataset::new("GSE29172", "Ovarian Cancer Study", 78, ORGANISM),
        Dataset::new("GSE14827", "Kidney Cancer Analysis", 134, ORGANISM),
        Dataset::new("GSE12417", "Brain Tumor Expression", 67, ORGANISM),
    ]
}

#[allow(clippy::too_many_arguments)]
fn details(
    id: &str,
    title: &str,
    description: &str,
    samples: u32,
    platform: &str,
    diseases: &[&str],
    dates: (&str, &str),
    contributors: &[&str],
    publication: &str,
) -> DatasetDetails {
    let mut dataset = Dataset::new(id, title, samples, "Homo sapiens");
    dataset.description = Some(description.to_string());
    dataset.diseases = diseases.iter().map(|s| s.to_string()).collect();
    dataset.submission_date = Some(dates.0.to_string());
    dataset.last_update = Some(dates.1.to_string());
    DatasetDetails {
        dataset,
        platform: platform.to_string(),
        contributors: contributors.iter().map(|s| s.to_string()).collect(),
        publication: publication.to_string(),
    }
}

/// Detail record for the info page. Unknown ids get a generic record
/// carrying the requested id.
pub fn dataset_details(id: &str) -> DatasetDetails {
    match id {
        "GSE42872" => details(
            id,
            "Breast Cancer Expression Analysis",
            "Gene expression profiling of breast cancer samples to identify molecular subtypes \
             and therapeutic targets.",
            104,
            "Affymetrix Human Genome U133A 2.0 Array",
            &["Breast Cancer", "Control"],
            ("2012-12-03", "2013-01-15"),
            &["Smith, J.", "Johnson, A.", "Brown, K."],
            "Nature Medicine 2013",
        ),
        "GSE2034" => details(
            id,
            "Breast Cancer Outcome Prediction",
            "Expression profiles for predicting patient outcome in node-negative breast cancer.",
            286,
            "Affymetrix Human Genome U133A Array",
            &["Breast Cancer", "Recurrence", "Non-recurrence"],
            ("2005-03-15", "2005-06-20"),
            &["Wang, Y.", "Klijn, J.G.", "Zhang, Y."],
            "The Lancet 2005",
        ),
        _ => details(
            id,
            "Dataset Information",
            "Detailed information about the selected gene expression dataset.",
            100,
            "Affymetrix Array",
            &["Cancer", "Control"],
            ("2020-01-01", "2020-06-01"),
            &["Research Team"],
            "Scientific Journal 2020",
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GeneTableStats;

    #[test]
    fn six_demo_genes_in_quick_access_order() {
        let genes = top_genes();
        let symbols: Vec<&str> = genes.iter().map(|g| g.symbol.as_str()).collect();
        assert_eq!(symbols, QUICK_ACCESS_GENES);
        assert_eq!(genes[0].log_fc, 2.45);
    }

    #[test]
    fn demo_gene_stats() {
        let stats = GeneTableStats::from_genes(&top_genes());
        assert_eq!(stats.total, 6);
        assert_eq!(stats.upregulated, 4);
        assert_eq!(stats.downregulated, 2);
        assert_eq!(stats.significant, 6);
    }

    #[test]
    fn demo_classifier_reads_as_eighty_seven_percent() {
        let results = classifier_results();
        assert_eq!(crate::models::percent(results.accuracy), "87.0%");
        assert_eq!(results.confusion_matrix, [[45, 7], [6, 42]]);
    }

    #[test]
    fn catalogue_has_ten_unique_studies() {
        let mut ids: Vec<String> = datasets().into_iter().map(|d| d.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 10);
    }

    #[test]
    fn unknown_dataset_gets_default_details() {
        let info = dataset_details("GSE999");
        assert_eq!(info.dataset.id, "GSE999");
        assert_eq!(info.dataset.samples, 100);
        assert_eq!(info.samples_per_condition(), 50);
        assert_eq!(dataset_details("GSE2034").samples_per_condition(), 95);
    }
}
