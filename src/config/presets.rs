// ==========================================
// SSP 犯罪数据 ETL - 内置预设
// ==========================================
// 职责: 两类已知 SSP 导出的完整管道配置
// - dados-criminais: SPDadosCriminais_*.xlsx（首个工作表，大写规范列名）
// - produtividade:   DadosProdutividade_*.xlsx（"PRESOS E APREENDIDOS" 工作表，小写规范列名）
// ==========================================

use crate::config::pipeline_config::{
    ColumnRename, ConfigError, ConfigResult, DateConfig, FilterRule, IntegerPolicy,
    MissingColumnPolicy, PipelineConfig, DEFAULT_DATE_FORMAT, DEFAULT_SENTINEL,
    DEFAULT_SOURCE_CONCURRENCY,
};
use crate::domain::schema::TypeSchema;
use crate::domain::types::FieldType;

/// 预设名称
pub const PRESET_DADOS_CRIMINAIS: &str = "dados-criminais";
pub const PRESET_PRODUTIVIDADE: &str = "produtividade";
pub const PRESET_NAMES: &[&str] = &[PRESET_DADOS_CRIMINAIS, PRESET_PRODUTIVIDADE];

/// 默认过滤：DDM 索罗卡巴 / 沃托兰廷
fn default_filters() -> Vec<FilterRule> {
    vec![
        FilterRule {
            column: "NOME_DELEGACIA".to_string(),
            accepted: strings(&["DDM SOROCABA", "DDM VOTORANTIM"]),
        },
        FilterRule {
            column: "NOME_MUNICIPIO".to_string(),
            accepted: strings(&["SOROCABA", "VOTORANTIM"]),
        },
    ]
}

/// 按名称取预设
pub fn preset(name: &str) -> ConfigResult<PipelineConfig> {
    match name.trim().to_lowercase().as_str() {
        PRESET_DADOS_CRIMINAIS => Ok(dados_criminais()),
        PRESET_PRODUTIVIDADE => Ok(produtividade()),
        other => Err(ConfigError::UnknownPreset(other.to_string())),
    }
}

/// 犯罪登记数据（单表导出）
pub fn dados_criminais() -> PipelineConfig {
    let schema = TypeSchema::from_pairs(&[
        ("NOME_DELEGACIA", FieldType::Text),
        ("NOME_MUNICIPIO", FieldType::Text),
        ("DATA_OCORRENCIA_BO", FieldType::Date),
        ("HORA_OCORRENCIA_BO", FieldType::Time),
        ("DESC_PERIODO", FieldType::Text),
        ("DIA_SEMANA", FieldType::Text),
        ("MES_OCORRENCIA", FieldType::Integer),
        ("ANO_ESTATISTICA", FieldType::Integer),
        ("DESCR_SUBTIPOLOCAL", FieldType::Text),
        ("BAIRRO", FieldType::Text),
        ("LOGRADOURO", FieldType::Text),
        ("LATITUDE", FieldType::Float),
        ("LONGITUDE", FieldType::Float),
        ("RUBRICA", FieldType::Text),
        ("DESCR_CONDUTA", FieldType::Text),
        ("NATUREZA_APURADA", FieldType::Text),
    ]);

    PipelineConfig {
        name: PRESET_DADOS_CRIMINAIS.to_string(),
        sheet_prefix: None,
        first_sheet_only: true,
        source_concurrency: DEFAULT_SOURCE_CONCURRENCY,
        skip_failed_sources: false,
        filters: default_filters(),
        missing_filter_column: MissingColumnPolicy::Skip,
        date: Some(DateConfig {
            column: "DATA_OCORRENCIA_BO".to_string(),
            format: DEFAULT_DATE_FORMAT.to_string(),
            month_column: "MES_OCORRENCIA".to_string(),
            year_column: "ANO_OCORRENCIA".to_string(),
            weekday_column: "DIA_SEMANA".to_string(),
        }),
        time_column: Some("HORA_OCORRENCIA_BO".to_string()),
        null_fill_columns: strings(&["DESC_PERIODO", "DESCR_CONDUTA", "BAIRRO", "LOGRADOURO"]),
        sentinel: DEFAULT_SENTINEL.to_string(),
        rename: Vec::new(),
        normalize_text: false,
        integer_columns: strings(&["ANO_ESTATISTICA", "MES_OCORRENCIA"]),
        float_columns: strings(&["LATITUDE", "LONGITUDE"]),
        integer_policy: IntegerPolicy::DropRow,
        final_columns: schema.fields().iter().map(|f| f.name.clone()).collect(),
        schema,
        numeric_check_columns: strings(&[
            "MES_OCORRENCIA",
            "ANO_ESTATISTICA",
            "LATITUDE",
            "LONGITUDE",
        ]),
        destination_table: "dados_ssp.dados_2025".to_string(),
    }
}

/// 产出数据（多工作表导出，仅取"PRESOS E APREENDIDOS"）
pub fn produtividade() -> PipelineConfig {
    let schema = TypeSchema::from_pairs(&[
        ("codigo_bo", FieldType::Text),
        ("nome_municipio", FieldType::Text),
        ("nome_delegacia", FieldType::Text),
        ("ano_ocorrencia", FieldType::Integer),
        ("mes_ocorrencia", FieldType::Integer),
        ("data_ocorrencia_bo", FieldType::Date),
        ("hora_ocorrencia_bo", FieldType::Time),
        ("periodo_ocorrencia", FieldType::Text),
        ("dia_semana", FieldType::Text),
        ("local_ocorrencia", FieldType::Text),
        ("bairro", FieldType::Text),
        ("logradouro", FieldType::Text),
        ("latitude", FieldType::Float),
        ("longitude", FieldType::Float),
        ("tipo_ocorrencia", FieldType::Text),
        ("flagrante", FieldType::Text),
        ("natureza_autor", FieldType::Text),
        ("sexo_autor", FieldType::Text),
        ("idade_autor", FieldType::Integer),
        ("raca_autor", FieldType::Text),
        ("profissao_autor", FieldType::Text),
        ("escolaridade_autor", FieldType::Text),
    ]);

    let rename = [
        ("NUM_BO", "codigo_bo"),
        ("NOME_MUNICIPIO", "nome_municipio"),
        ("NOME_DELEGACIA", "nome_delegacia"),
        ("MES_OCORRENCIA", "mes_ocorrencia"),
        ("DATA_OCORRENCIA_BO", "data_ocorrencia_bo"),
        ("HORA_OCORRENCIA_BO", "hora_ocorrencia_bo"),
        ("DESCR_PERIODO", "periodo_ocorrencia"),
        ("DIA_SEMANA", "dia_semana"),
        ("DESCR_SUBTIPOLOCAL", "local_ocorrencia"),
        ("BAIRRO", "bairro"),
        ("LOGRADOURO", "logradouro"),
        ("LATITUDE", "latitude"),
        ("LONGITUDE", "longitude"),
        ("NATUREZA_APURADA", "tipo_ocorrencia"),
        ("FLAG_FLAGRANTE", "flagrante"),
        ("DESCR_TIPO_PESSOA", "natureza_autor"),
        ("SEXO_PESSOA", "sexo_autor"),
        ("IDADE_PESSOA", "idade_autor"),
        ("COR_CURTIS", "raca_autor"),
        ("DESCR_PROFISSAO", "profissao_autor"),
        ("DESCR_GRAU_INSTRUCAO", "escolaridade_autor"),
    ]
    .iter()
    .map(|(from, to)| ColumnRename {
        from: from.to_string(),
        to: to.to_string(),
    })
    .collect();

    PipelineConfig {
        name: PRESET_PRODUTIVIDADE.to_string(),
        sheet_prefix: Some("PRESOS E APREENDIDOS".to_string()),
        first_sheet_only: false,
        source_concurrency: DEFAULT_SOURCE_CONCURRENCY,
        skip_failed_sources: false,
        filters: default_filters(),
        missing_filter_column: MissingColumnPolicy::Skip,
        date: Some(DateConfig {
            column: "DATA_OCORRENCIA_BO".to_string(),
            format: DEFAULT_DATE_FORMAT.to_string(),
            month_column: "MES_OCORRENCIA".to_string(),
            year_column: "ano_ocorrencia".to_string(),
            weekday_column: "DIA_SEMANA".to_string(),
        }),
        time_column: Some("hora_ocorrencia_bo".to_string()),
        null_fill_columns: strings(&[
            "DESCR_PERIODO",
            "BAIRRO",
            "LOGRADOURO",
            "DESCR_PROFISSAO",
            "DESCR_GRAU_INSTRUCAO",
        ]),
        sentinel: DEFAULT_SENTINEL.to_string(),
        rename,
        normalize_text: true,
        integer_columns: strings(&["ano_ocorrencia", "mes_ocorrencia", "idade_autor"]),
        float_columns: strings(&["latitude", "longitude"]),
        integer_policy: IntegerPolicy::KeepNull,
        final_columns: schema.fields().iter().map(|f| f.name.clone()).collect(),
        schema,
        numeric_check_columns: strings(&[
            "mes_ocorrencia",
            "ano_ocorrencia",
            "latitude",
            "longitude",
        ]),
        destination_table: "dados_ssp.dados_produtividade".to_string(),
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_validate() {
        for name in PRESET_NAMES {
            let config = preset(name).unwrap();
            assert!(config.validate().is_ok(), "preset {} invalid", name);
        }
    }

    #[test]
    fn test_unknown_preset() {
        assert!(matches!(preset("nope"), Err(ConfigError::UnknownPreset(_))));
    }

    #[test]
    fn test_preset_json_roundtrip_preserves_rename_order() {
        let config = produtividade();
        let json = config.to_json_pretty().unwrap();
        let parsed = PipelineConfig::from_json_str(&json).unwrap();
        assert_eq!(parsed.rename.first().unwrap().from, "NUM_BO");
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_final_columns_cover_schema() {
        let config = produtividade();
        for column in &config.final_columns {
            assert!(config.schema.field(column).is_some());
        }
    }
}
