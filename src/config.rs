use std::path::{Path, PathBuf};

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::{NotaError, Result};
use crate::models::{FeeKind, TradeType};

// ---------------------------------------------------------------------------
// Configuration data
// ---------------------------------------------------------------------------
//
// Every pattern table the pipeline consults lives here as plain data:
// editable JSON in, compiled regexes out. Pipeline logic never declares a
// pattern of its own.

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    #[serde(default = "default_brokers")]
    pub brokers: Vec<BrokerSignature>,
    #[serde(default = "default_note_number_patterns")]
    pub note_number_patterns: Vec<String>,
    #[serde(default = "default_trade_date_patterns")]
    pub trade_date_patterns: Vec<String>,
    #[serde(default = "default_table_keyword_sets")]
    pub table_keyword_sets: Vec<Vec<String>>,
    #[serde(default = "default_column_candidates")]
    pub columns: ColumnCandidates,
    #[serde(default = "default_cascade_rules")]
    pub cascade_rules: Vec<CascadeRule>,
    #[serde(default = "default_section_markers")]
    pub section_markers: Vec<SectionMarker>,
    #[serde(default = "default_fee_patterns")]
    pub fee_patterns: Vec<FeePatternSet>,
    #[serde(default = "default_futures_roots")]
    pub futures_roots: Vec<String>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            brokers: default_brokers(),
            note_number_patterns: default_note_number_patterns(),
            trade_date_patterns: default_trade_date_patterns(),
            table_keyword_sets: default_table_keyword_sets(),
            columns: default_column_candidates(),
            cascade_rules: default_cascade_rules(),
            section_markers: default_section_markers(),
            fee_patterns: default_fee_patterns(),
            futures_roots: default_futures_roots(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerSignature {
    pub name: String,
    pub pattern: String,
}

/// Candidate header terms per column role, lowercase and accent-folded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnCandidates {
    pub trade_type: Vec<String>,
    pub asset: Vec<String>,
    pub quantity: Vec<String>,
    pub price: Vec<String>,
    pub total_value: Vec<String>,
    pub trade_nature: Vec<String>,
    pub debit_credit: Vec<String>,
    pub expiration: Vec<String>,
    pub operational_fee: Vec<String>,
}

/// One text-cascade rule: a pattern plus the mapping from its capture
/// groups to transaction fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CascadeRule {
    pub name: String,
    pub pattern: String,
    #[serde(default)]
    pub bindings: FieldBindings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldBindings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trade_type: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_value: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trade_nature: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debit_credit: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operational_fee: Option<usize>,
    /// Applied when the rule has no type group and no D/C group matched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_type: Option<TradeType>,
}

/// Marker pair delimiting a section of the note that is re-scanned with the
/// full cascade (e.g. the "negócios realizados" block).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionMarker {
    pub name: String,
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeePatternSet {
    pub kind: FeeKind,
    pub patterns: Vec<String>,
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Location of the optional user-edited pattern file.
pub fn user_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("corretagem")
        .join("patterns.json")
}

impl ExtractorConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Resolve configuration: an explicit `--config` path, then the user
    /// config file if present, then the built-in tables.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let user = user_config_path();
        if user.exists() {
            return Self::load(&user);
        }
        Ok(Self::default())
    }

    /// Compile every pattern once. Called at pipeline construction; pattern
    /// errors from an edited config surface here, not mid-extraction.
    pub fn compile(&self) -> Result<CompiledConfig> {
        let compile = |pattern: &str| -> Result<Regex> {
            RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .map_err(NotaError::from)
        };

        let mut brokers = Vec::with_capacity(self.brokers.len());
        for b in &self.brokers {
            brokers.push((b.name.clone(), compile(&b.pattern)?));
        }

        let note_number = self
            .note_number_patterns
            .iter()
            .map(|p| compile(p))
            .collect::<Result<Vec<_>>>()?;
        let trade_date = self
            .trade_date_patterns
            .iter()
            .map(|p| compile(p))
            .collect::<Result<Vec<_>>>()?;

        let mut cascade = Vec::with_capacity(self.cascade_rules.len());
        for rule in &self.cascade_rules {
            cascade.push(CompiledRule {
                regex: compile(&rule.pattern)?,
                bindings: rule.bindings.clone(),
            });
        }

        let mut sections = Vec::with_capacity(self.section_markers.len());
        for marker in &self.section_markers {
            let span = format!("(?is)(?:{})(.+?)(?:{})", marker.start, marker.end);
            sections.push((marker.name.clone(), compile(&span)?));
        }

        let mut fees = Vec::with_capacity(self.fee_patterns.len());
        for set in &self.fee_patterns {
            let compiled = set
                .patterns
                .iter()
                .map(|p| compile(p))
                .collect::<Result<Vec<_>>>()?;
            fees.push((set.kind, compiled));
        }

        Ok(CompiledConfig {
            brokers,
            note_number,
            trade_date,
            table_keyword_sets: self.table_keyword_sets.clone(),
            columns: self.columns.clone(),
            cascade,
            sections,
            fees,
            futures_roots: self.futures_roots.clone(),
        })
    }
}

/// Regex-compiled form of [`ExtractorConfig`], built once per pipeline.
pub struct CompiledConfig {
    pub brokers: Vec<(String, Regex)>,
    pub note_number: Vec<Regex>,
    pub trade_date: Vec<Regex>,
    pub table_keyword_sets: Vec<Vec<String>>,
    pub columns: ColumnCandidates,
    pub cascade: Vec<CompiledRule>,
    pub sections: Vec<(String, Regex)>,
    pub fees: Vec<(FeeKind, Vec<Regex>)>,
    pub futures_roots: Vec<String>,
}

pub struct CompiledRule {
    pub regex: Regex,
    pub bindings: FieldBindings,
}

// ---------------------------------------------------------------------------
// Built-in tables
// ---------------------------------------------------------------------------

fn sig(name: &str, pattern: &str) -> BrokerSignature {
    BrokerSignature {
        name: name.to_string(),
        pattern: pattern.to_string(),
    }
}

fn default_brokers() -> Vec<BrokerSignature> {
    vec![
        sig("XP", r"XP\s+INVESTIMENTOS|CORRETORA\s+XP"),
        sig("Clear", r"CLEAR\s+CORRETORA|CLEAR\s+CTVM"),
        sig("Rico", r"RICO\s+INVESTIMENTOS|RICO\s+CTVM"),
        sig("Modal", r"MODAL\s+DTVM|MODAL\s+MAIS"),
        sig("Inter", r"INTER\s+DTVM|BANCO\s+INTER"),
        sig("Guide", r"GUIDE\s+INVESTIMENTOS"),
        sig("NuInvest", r"NU\s+INVEST|NUINVEST|EASYNVEST"),
        sig("Itaú", r"ITA[UÚ]\s+CORRETORA"),
        sig("Bradesco", r"BRADESCO\s+S/?A|BRADESCO\s+CORRETORA"),
        sig("Santander", r"SANTANDER\s+CORRETORA|SANTANDER\s+CTVM"),
        sig("BTG Pactual", r"BTG\s+PACTUAL"),
        sig("Genial", r"GENIAL\s+INVESTIMENTOS"),
        sig("Terra", r"TERRA\s+INVESTIMENTOS"),
        sig("Órama", r"[ÓO]RAMA\s+DTVM"),
        sig("Necton", r"NECTON\s+INVESTIMENTOS"),
        sig("Nova Futura", r"NOVA\s+FUTURA\s+CTVM"),
        sig("Toro", r"TORO\s+INVESTIMENTOS"),
        sig("C6", r"C6\s+CTVM|C6\s+BANK"),
        sig("Mirae", r"MIRAE\s+ASSET"),
    ]
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn default_note_number_patterns() -> Vec<String> {
    strings(&[
        r"Nr\.\s*(?:nota|order|negoci\w*)\s*:\s*(\d+)",
        r"N[o°º]\s*(?:da\s+nota|nota)\s*:\s*(\d+)",
        r"N[úu]mero\s*(?:da\s+nota|nota|folha)\s*:\s*(\d+)",
        r"(?:Nota|Folha)\s*(?:n[o°º]|n[úu]mero|#)\s*:?\s*(\d+)",
        r"Nr\.?\s*Boleta\s*:?\s*(\d+)",
        r"Boleta\s+N[o°º]\s*(\d+)",
        r"(?:NOTA|BOLETA)\s+DE\s+(?:CORRETAGEM|NEGOCIA[ÇC][ÃA]O)\s*[^\d]*(\d+)",
    ])
}

fn default_trade_date_patterns() -> Vec<String> {
    const DATE: &str = r"(\d{2}[/-]\d{2}[/-](?:\d{4}|\d{2}))";
    [
        r"Data\s+preg[ãa]o\s*:\s*",
        r"D\.?\s*Preg[ãa]o\s*:?\s*",
        r"Preg[ãa]o(?:\s+de)?\s*:\s*",
        r"(?:Data|Date)\s+(?:de\s+|da\s+|do\s+)?(?:neg[oó]cio|negocia[çc][ãa]o|opera[çc][õo]es)\s*:?\s*",
        r"(?:Data|Date)\s*Liquida[çc][ãa]o\s*:?\s*",
        r"(?:Data|Date|Dia)\s*:\s*",
    ]
    .iter()
    .map(|prefix| format!("{prefix}{DATE}"))
    .chain(std::iter::once(r"\d+_(\d{8})_\d{8}".to_string()))
    .collect()
}

fn default_table_keyword_sets() -> Vec<Vec<String>> {
    [
        &["c/v", "quant", "preco"][..],
        &["cv", "quant", "preco"],
        &["c/v", "tipo", "quantidade", "preco"],
        &["compra", "venda", "quantidade", "preco"],
        &["operacao", "quantidade", "preco", "valor"],
        &["negocios", "tipo", "qtde", "valor"],
        &["ativo", "tipo", "quantidade", "valor"],
        &["mercadoria", "quantidade", "preco"],
    ]
    .iter()
    .map(|set| strings(set))
    .collect()
}

fn default_column_candidates() -> ColumnCandidates {
    ColumnCandidates {
        trade_type: strings(&["c/v", "cv", "tipo", "compra/venda", "operacao", "natureza"]),
        asset: strings(&[
            "titulo",
            "ativo",
            "papel",
            "especificacao",
            "codigo",
            "mercadoria",
            "instrumento",
        ]),
        quantity: strings(&["quantidade", "qtde", "quant", "qtd", "contratos", "qt"]),
        price: strings(&[
            "preco",
            "unitario",
            "unit",
            "cotacao",
            "valor/ajuste",
            "preco/ajuste",
            "ajuste",
            "liquidacao",
        ]),
        total_value: strings(&["valor op", "valor operacao", "total", "financeiro"]),
        trade_nature: strings(&[
            "tipo negocio",
            "tipo de negocio",
            "mercado",
            "modalidade",
            "day trade",
        ]),
        debit_credit: strings(&["d/c", "debito/credito"]),
        expiration: strings(&["vencimento", "venc", "data venc", "prazo"]),
        operational_fee: strings(&["taxa op", "taxa operacional", "taxa"]),
    }
}

fn rule(name: &str, pattern: &str, bindings: FieldBindings) -> CascadeRule {
    CascadeRule {
        name: name.to_string(),
        pattern: pattern.to_string(),
        bindings,
    }
}

fn default_cascade_rules() -> Vec<CascadeRule> {
    vec![
        // C VISTA PETR4 1000 28,50 28500,00
        rule(
            "cash-market",
            r"\b([CV])\s+(?:VISTA|OPCAO|OP[ÇC][ÃA]O|TERMO)\s+([A-Z][A-Z0-9]{3,11})\s+(\d+(?:\.\d+)?)\s+([\d.,]+)\s+([\d.,]+)",
            FieldBindings {
                trade_type: Some(1),
                asset: Some(2),
                quantity: Some(3),
                price: Some(4),
                total_value: Some(5),
                ..FieldBindings::default()
            },
        ),
        // COMPRA AÇÕES ITSA4 500 12,34 6.170,00
        rule(
            "named-equity",
            r"\b(COMPRA|VENDA)\s+(?:A[ÇC][ÕO]ES|OP[ÇC][ÕO]ES)\s+([A-Z][A-Z0-9]{3,11})\s+(\d+(?:\.\d+)?)\s+([\d.,]+)\s+([\d.,]+)",
            FieldBindings {
                trade_type: Some(1),
                asset: Some(2),
                quantity: Some(3),
                price: Some(4),
                total_value: Some(5),
                ..FieldBindings::default()
            },
        ),
        // 1 C ON VALE3 100 77,10 7.710,00
        rule(
            "numbered-equity",
            r"\d+\s+([CV])\s+(?:ON|PN|UNIT)\s+([A-Z][A-Z0-9]{3,11})\s+(\d+(?:\.\d+)?)\s+([\d.,]+)\s+([\d.,]+)",
            FieldBindings {
                trade_type: Some(1),
                asset: Some(2),
                quantity: Some(3),
                price: Some(4),
                total_value: Some(5),
                ..FieldBindings::default()
            },
        ),
        // DOL H23 FUTURO | COMPRA | 2 | 5.050,00
        rule(
            "pipe-market",
            r"([A-Z0-9]{2,6}\s+[A-Z]\d{1,2})\s+(?:FUTURO|VISTA|OP[ÇC][ÃA]O|TERMO)\s*\|\s*(COMPRA|VENDA)\s*\|\s*(\d+(?:\.\d+)?)\s*\|\s*([\d.,]+)",
            FieldBindings {
                asset: Some(1),
                trade_type: Some(2),
                quantity: Some(3),
                price: Some(4),
                ..FieldBindings::default()
            },
        ),
        // DOL    FUTURO    COMPRA    5    5.050,00
        rule(
            "spaced-market",
            r"\b([A-Z0-9]{2,6}(?:\s+[A-Z]\d{1,2})?)\s+(?:FUTURO|VISTA|OP[ÇC][ÃA]O|TERMO)\s+(COMPRA|VENDA)\s+(\d+(?:\.\d+)?)\s+([\d.,]+)",
            FieldBindings {
                asset: Some(1),
                trade_type: Some(2),
                quantity: Some(3),
                price: Some(4),
                ..FieldBindings::default()
            },
        ),
        // C WINJ25 3 131.820,0000 DAY TRADE 82,80 C 0,00
        rule(
            "futures-detailed",
            r"\b([CV])\s+([A-Z0-9]{4,8})\s+(\d+)\s+([\d.,]+)\s+(DAY\s*TRADE|NORMAL)\s+([\d.,]+)\s+([CD])\s+([\d.,]+)",
            FieldBindings {
                trade_type: Some(1),
                asset: Some(2),
                quantity: Some(3),
                price: Some(4),
                trade_nature: Some(5),
                debit_credit: Some(7),
                operational_fee: Some(8),
                ..FieldBindings::default()
            },
        ),
        // C WDO F25 02/01/2025 1 6.088,0000 DAY TRADE
        rule(
            "futures-dated",
            r"\b([CV])\s+([A-Z]{2,5}\s+[A-Z]\d{1,2}|[A-Z]{3,4}[FGHJKMNQUVXZ]\d{2})\s+(?:\d{2}/\d{2}/\d{4}\s+)?(\d+)\s+([\d.,]+)(?:\s+(DAY\s*TRADE|NORMAL))?",
            FieldBindings {
                trade_type: Some(1),
                asset: Some(2),
                quantity: Some(3),
                price: Some(4),
                trade_nature: Some(5),
                ..FieldBindings::default()
            },
        ),
        // C WDOK23 10 5.278,50
        rule(
            "futures-compact",
            r"\b([CV])\s+([A-Z]{3,4}[FGHJKMNQUVXZ]\d{2})\s+(\d+)\s+([\d.,]+)(?:\s+(DAY\s*TRADE|NORMAL))?",
            FieldBindings {
                trade_type: Some(1),
                asset: Some(2),
                quantity: Some(3),
                price: Some(4),
                trade_nature: Some(5),
                ..FieldBindings::default()
            },
        ),
        // WINFUT WIN N22 1 115180.0
        rule(
            "winfut",
            r"\b(?:WINFUT|DOLFUT|INDFUT)\s+([A-Z0-9]{2,6}\s+[A-Z0-9]{1,4})\s+(\d+(?:\.\d+)?)\s+([\d.,]+)",
            FieldBindings {
                asset: Some(1),
                quantity: Some(2),
                price: Some(3),
                default_type: Some(TradeType::Buy),
                ..FieldBindings::default()
            },
        ),
        // Last resort, whole line only: C PETR4 1000
        rule(
            "bare-ticker",
            r"(?m)^\s*([CV])\s+([A-Z]{4}\d{1,2})\s+(\d+(?:\.\d+)?)\s*$",
            FieldBindings {
                trade_type: Some(1),
                asset: Some(2),
                quantity: Some(3),
                ..FieldBindings::default()
            },
        ),
    ]
}

fn default_section_markers() -> Vec<SectionMarker> {
    vec![
        SectionMarker {
            name: "negocios-realizados".to_string(),
            start: r"NEG[ÓO]CIOS\s+REALIZADOS|RESUMO\s+DOS\s+NEG[ÓO]CIOS".to_string(),
            end: r"RESUMO\s+FINANCEIRO|CUSTOS".to_string(),
        },
        SectionMarker {
            name: "bmf-contratos".to_string(),
            start: r"MERCADORIAS|ESPECIFICA[ÇC][ÃA]O|CONTRATOS".to_string(),
            end: r"RESUMO\s+FINANCEIRO|CUSTOS|TOTAL".to_string(),
        },
    ]
}

fn fee(kind: FeeKind, patterns: &[&str]) -> FeePatternSet {
    FeePatternSet {
        kind,
        patterns: strings(patterns),
    }
}

fn default_fee_patterns() -> Vec<FeePatternSet> {
    // Bare single-word fallbacks require an explicit decimal-comma amount so
    // they cannot latch onto dates ("Data Liquidação: 02/04/2025").
    vec![
        fee(
            FeeKind::Settlement,
            &[
                r"taxa\s+de\s+liquida[çc][ãa]o\s*:?\s*(?:R\$)?\s*([\d.,]+)",
                r"\bliquida[çc][ãa]o\s*:?\s*(?:R\$)?\s*(\d+,\d{2})",
            ],
        ),
        fee(
            FeeKind::Registration,
            &[
                r"taxa\s+de\s+registro\s*:?\s*(?:R\$)?\s*([\d.,]+)",
                r"\bregistro\s*:?\s*(?:R\$)?\s*(\d+,\d{2})",
            ],
        ),
        fee(
            FeeKind::TermOptions,
            &[
                r"taxa\s+de\s+termo\s*/?\s*op[çc][õo]es\s*:?\s*(?:R\$)?\s*([\d.,]+)",
                r"termo\s*/\s*op[çc][õo]es\s*:?\s*(?:R\$)?\s*([\d.,]+)",
                r"taxa\s+de\s+op[çc][õo]es\s*:?\s*(?:R\$)?\s*([\d.,]+)",
            ],
        ),
        fee(
            FeeKind::Exchange,
            &[r"emolumentos\s*:?\s*(?:R\$)?\s*([\d.,]+)"],
        ),
        fee(
            FeeKind::Operational,
            &[
                r"taxa\s+(?:de\s+)?operacional\s*:?\s*(?:R\$)?\s*([\d.,]+)",
                r"taxa\s+(?:de\s+)?opera[çc][ãa]o\s*:?\s*(?:R\$)?\s*([\d.,]+)",
                r"\boperacional\s*:?\s*(?:R\$)?\s*(\d+,\d{2})",
            ],
        ),
        fee(
            FeeKind::Brokerage,
            &[r"corretagem\s*:?\s*(?:R\$)?\s*([\d.,]+)"],
        ),
        fee(
            FeeKind::WithholdingTax,
            &[
                r"i\.?r\.?r\.?f\.?(?:\s+retido)?(?:\s+na\s+fonte)?\s*:?\s*(?:R\$)?\s*([\d.,]+)",
                r"imposto\s+de\s+renda\s*:?\s*(?:R\$)?\s*([\d.,]+)",
            ],
        ),
        fee(
            FeeKind::OtherTaxes,
            &[
                r"\bi\.?s\.?s\.?\s*:?\s*(?:R\$)?\s*([\d.,]+)",
                r"outras\s+taxas\s*:?\s*(?:R\$)?\s*([\d.,]+)",
                r"\bimpostos\s*:?\s*(?:R\$)?\s*([\d.,]+)",
            ],
        ),
        fee(
            FeeKind::NetValue,
            &[
                r"valor\s+l[íi]quido(?:\s+(?:para|da\s+nota))?(?:\s+\d{2}/\d{2}/\d{4})?\s*:?\s*(?:R\$)?\s*([\d.,]+)",
                r"l[íi]quido\s+para\s+liquida[çc][ãa]o(?:\s+\d{2}/\d{2}/\d{4})?\s*:?\s*(?:R\$)?\s*([\d.,]+)",
                r"total\s+l[íi]quido\s*:?\s*(?:R\$)?\s*([\d.,]+)",
            ],
        ),
        fee(
            FeeKind::Adjustment,
            &[
                r"taxa\s+de\s+ajuste\s*:?\s*(?:R\$)?\s*([\d.,]+)",
                r"\bajuste\s*:?\s*(?:R\$)?\s*(\d+,\d{2})",
            ],
        ),
        fee(
            FeeKind::OperationDc,
            &[
                r"valor\s+(?:de\s+|da\s+)?opera[çc][ãa]o\s*(?:/\s*d\s*/?\s*c)?\s*:?\s*(?:R\$)?\s*([\d.,]+)",
                r"valor\s+d\s*/\s*c\s*:?\s*(?:R\$)?\s*([\d.,]+)",
            ],
        ),
    ]
}

fn default_futures_roots() -> Vec<String> {
    strings(&[
        "WIN", "WDO", "DOL", "IND", "BGI", "CCM", "ICF", "DI1", "DAP", "SJC", "ISP", "EUR",
        "FRC", "BOI", "B3", "DDI", "DI",
    ])
}
