//! The fixed canonical sample schema.
//!
//! Every mappable attribute of a sample record is a [`FieldKey`]. The
//! [`FIELDS`] catalog carries, per key, the storage column name, a display
//! label and the [`FieldKind`] that decides how raw cells are coerced.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::ModelError;
use crate::ids::IdKind;

/// How a canonical field is resolved from raw cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Cross-referenced identifier; only the first mapped column is read.
    Identifier(IdKind),
    /// Floating point value; only the first mapped column is read.
    Number,
    /// Free text; every mapped column is concatenated with its delimiter.
    Text,
    /// Collection date; only the first mapped column is read.
    Date,
}

impl FieldKind {
    /// True for kinds that only ever consult the first mapped column.
    pub fn is_single_column(&self) -> bool {
        !matches!(self, FieldKind::Text)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Identifier(_) => "identifier",
            FieldKind::Number => "number",
            FieldKind::Text => "text",
            FieldKind::Date => "date",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldKey {
    DonorId,
    MasterId,
    SampleId,
    Price,
    Quantity,
    Unit,
    Matrix,
    StorageTemperature,
    FreezeThawCycles,
    SampleCondition,
    InfectiousDiseaseTestResult,
    Gender,
    Age,
    Ethnicity,
    Bmi,
    LabParameter,
    ResultInterpretation,
    ResultRaw,
    ResultNumerical,
    ResultUnit,
    CutOffRaw,
    CutOffNumerical,
    TestMethod,
    TestSystem,
    TestSystemManufacturer,
    ResultObtainedFrom,
    Diagnosis,
    DiagnosisRemarks,
    IcdCode,
    PregnancyWeek,
    PregnancyTrimester,
    Medication,
    Therapy,
    HistologicalDiagnosis,
    Organ,
    DiseasePresentation,
    TnmClassT,
    TnmClassN,
    TnmClassM,
    TumourGrade,
    TumourStage,
    ViableCellsPercent,
    NecroticCellsPercent,
    TumourCellsPercent,
    ProliferationRateKi67Percent,
    EstrogenReceptor,
    ProgesteronReceptor,
    Her2Receptor,
    OtherGeneMutations,
    CountryOfCollection,
    DateOfCollection,
    ProcurementType,
    InformedConsent,
}

/// Catalog entry for one canonical field.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub key: FieldKey,
    /// Storage column name.
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    /// Lab-result attribute that repeats per sample and is listed, not
    /// overwritten, when rows are grouped by sample ID.
    pub per_result: bool,
}

const fn spec(
    key: FieldKey,
    name: &'static str,
    label: &'static str,
    kind: FieldKind,
    per_result: bool,
) -> FieldSpec {
    FieldSpec {
        key,
        name,
        label,
        kind,
        per_result,
    }
}

use FieldKind::{Date, Number, Text};

/// All canonical fields in schema order. `FIELDS[key as usize].key == key`.
pub const FIELDS: [FieldSpec; 53] = [
    spec(FieldKey::DonorId, "CBH_Donor_ID", "Donor ID", FieldKind::Identifier(IdKind::Donor), false),
    spec(FieldKey::MasterId, "CBH_Master_ID", "Master ID", FieldKind::Identifier(IdKind::Master), false),
    spec(FieldKey::SampleId, "CBH_Sample_ID", "Sample ID", FieldKind::Identifier(IdKind::Sample), false),
    spec(FieldKey::Price, "Price", "Price", Number, false),
    spec(FieldKey::Quantity, "Quantity", "Quantity", Number, false),
    spec(FieldKey::Unit, "Unit", "Unit", Text, false),
    spec(FieldKey::Matrix, "Matrix", "Matrix", Text, false),
    spec(FieldKey::StorageTemperature, "Storage_Temperature", "Storage Temperature", Text, false),
    spec(FieldKey::FreezeThawCycles, "Freeze_Thaw_Cycles", "Freeze Thaw Cycles", Number, false),
    spec(FieldKey::SampleCondition, "Sample_Condition", "Sample Condition", Text, false),
    spec(
        FieldKey::InfectiousDiseaseTestResult,
        "Infectious_Disease_Test_Result",
        "Infectious Disease Test Result",
        Text,
        false,
    ),
    spec(FieldKey::Gender, "Gender", "Gender", Text, false),
    spec(FieldKey::Age, "Age", "Age", Number, false),
    spec(FieldKey::Ethnicity, "Ethnicity", "Ethnicity", Text, false),
    spec(FieldKey::Bmi, "BMI", "BMI", Number, false),
    spec(FieldKey::LabParameter, "Lab_Parameter", "Lab Parameter", Text, true),
    spec(FieldKey::ResultInterpretation, "Result_Interpretation", "Result Interpretation", Text, true),
    spec(FieldKey::ResultRaw, "Result_Raw", "Result Raw", Text, true),
    spec(FieldKey::ResultNumerical, "Result_Numerical", "Result Numerical", Number, true),
    spec(FieldKey::ResultUnit, "Result_Unit", "Result Unit", Text, true),
    spec(FieldKey::CutOffRaw, "Cut_Off_Raw", "Cut Off Raw", Text, true),
    spec(FieldKey::CutOffNumerical, "Cut_Off_Numerical", "Cut Off Numerical", Number, true),
    spec(FieldKey::TestMethod, "Test_Method", "Test Method", Text, true),
    spec(FieldKey::TestSystem, "Test_System", "Test System", Text, true),
    spec(
        FieldKey::TestSystemManufacturer,
        "Test_System_Manufacturer",
        "Test System Manufacturer",
        Text,
        true,
    ),
    spec(FieldKey::ResultObtainedFrom, "Result_Obtained_From", "Result Obtained From", Text, true),
    spec(FieldKey::Diagnosis, "Diagnosis", "Diagnosis", Text, true),
    spec(FieldKey::DiagnosisRemarks, "Diagnosis_Remarks", "Diagnosis Remarks", Text, true),
    spec(FieldKey::IcdCode, "ICD_Code", "ICD Code", Text, true),
    spec(FieldKey::PregnancyWeek, "Pregnancy_Week", "Pregnancy Week", Number, false),
    spec(FieldKey::PregnancyTrimester, "Pregnancy_Trimester", "Pregnancy Trimester", Text, false),
    spec(FieldKey::Medication, "Medication", "Medication", Text, true),
    spec(FieldKey::Therapy, "Therapy", "Therapy", Text, true),
    spec(
        FieldKey::HistologicalDiagnosis,
        "Histological_Diagnosis",
        "Histological Diagnosis",
        Text,
        true,
    ),
    spec(FieldKey::Organ, "Organ", "Organ", Text, false),
    spec(FieldKey::DiseasePresentation, "Disease_Presentation", "Disease Presentation", Text, false),
    spec(FieldKey::TnmClassT, "TNM_Class_T", "TNM Class T", Text, false),
    spec(FieldKey::TnmClassN, "TNM_Class_N", "TNM Class N", Text, false),
    spec(FieldKey::TnmClassM, "TNM_Class_M", "TNM Class M", Text, false),
    spec(FieldKey::TumourGrade, "Tumour_Grade", "Tumour Grade", Text, false),
    spec(FieldKey::TumourStage, "Tumour_Stage", "Tumour Stage", Text, false),
    spec(FieldKey::ViableCellsPercent, "Viable_Cells__per_", "Viable Cells (%)", Text, false),
    spec(FieldKey::NecroticCellsPercent, "Necrotic_Cells__per_", "Necrotic Cells (%)", Text, false),
    spec(FieldKey::TumourCellsPercent, "Tumour_Cells__per_", "Tumour Cells (%)", Text, false),
    spec(
        FieldKey::ProliferationRateKi67Percent,
        "Proliferation_Rate__Ki67_per_",
        "Proliferation Rate Ki67 (%)",
        Text,
        false,
    ),
    spec(FieldKey::EstrogenReceptor, "Estrogen_Receptor", "Estrogen Receptor", Text, false),
    spec(FieldKey::ProgesteronReceptor, "Progesteron_Receptor", "Progesteron Receptor", Text, false),
    spec(FieldKey::Her2Receptor, "HER_2_Receptor", "HER-2 Receptor", Text, false),
    spec(FieldKey::OtherGeneMutations, "Other_Gene_Mutations", "Other Gene Mutations", Text, true),
    spec(FieldKey::CountryOfCollection, "Country_of_Collection", "Country of Collection", Text, false),
    spec(FieldKey::DateOfCollection, "Date_of_Collection", "Date of Collection", Date, false),
    spec(FieldKey::ProcurementType, "Procurement_Type", "Procurement Type", Text, false),
    spec(FieldKey::InformedConsent, "Informed_Consent", "Informed Consent", Text, false),
];

impl FieldKey {
    /// All keys in schema order.
    pub fn all() -> impl Iterator<Item = FieldKey> {
        FIELDS.iter().map(|spec| spec.key)
    }

    pub fn spec(&self) -> &'static FieldSpec {
        &FIELDS[*self as usize]
    }

    pub fn name(&self) -> &'static str {
        self.spec().name
    }

    pub fn label(&self) -> &'static str {
        self.spec().label
    }

    pub fn kind(&self) -> FieldKind {
        self.spec().kind
    }

    /// The identifier kind carried by this field, if it is an identifier.
    pub fn id_kind(&self) -> Option<IdKind> {
        match self.kind() {
            FieldKind::Identifier(kind) => Some(kind),
            _ => None,
        }
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FieldKey {
    type Err = ModelError;

    /// Accepts the storage column name or the display label, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        FIELDS
            .iter()
            .find(|spec| spec.name.eq_ignore_ascii_case(needle) || spec.label.eq_ignore_ascii_case(needle))
            .map(|spec| spec.key)
            .ok_or_else(|| ModelError::UnknownField(s.to_string()))
    }
}

impl Serialize for FieldKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for FieldKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
