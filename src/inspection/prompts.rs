// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Fixed instructions for each inspection task
//!
//! Answers are expected in Portuguese: SIM/NÃO, the switch names and the
//! nameplate form keys below.

pub const VEGETATION_PROMPT: &str = "\
Analise estas imagens do mesmo poste elétrico.
Existe vegetação encostando nos postes, fios ou transformador?
Responda apenas com SIM ou NÃO";

pub const SWITCH_PROMPT: &str = "\
Analise estas imagens do mesmo poste elétrico.
Qual o tipo de chave seccionadora instalada?
Responda se é 'Fusível' ou 'Fusível Religadora' ou 'Faca' ou 'A gás'. Responda apenas o nome da chave. Caso não encontre nenhuma, responda apenas null.";

/// Nameplate instructions and form; the OCR text is appended right after it
pub const NAMEPLATE_FORM_PROMPT: &str = r#"Esta imagem contém a placa de identificação de um transformador. Utilize a saída de um OCR abaixo para preencher o seguinte formulário. Retorne a saída em formato JSON, onde as chaves são os nomes dos campos do formulário e os valores são as informações correspondentes encontradas na placa.
Note que as primeiras linhas do OCR são os dados do fabricante.
Os campos do formulário são:

Transformador de distribuição:
{
"Código": "",
"Matrícula": "",
"Poste": "",
"Autoprotegido": "",
"Blindado": "",
"Capacidade da chave": "",
"Capacidade do ELO": "",
"Exclusivo para IP": "",
"Fases": "",
"Indica Paralelo": "",
"Indica Rede MEN": "",
"Potência nominal (kVA)": "",
"Med. Balanço Energ.": "",
"Posto": "",
"TAP": "",
"Zona de Distribuição Aérea": "",
"Tipo de aterramento": "",
"Tipo de instalação": "",
"Tipo de ligação": "",
"Alimentador": "",
"Tipo de montagem": "",
"Tipo de transformador": ""
}

Equipamento do transformador:
{
"Cód. Trafo": "",
"Cód. Equipamento": "",
"Classe": "",
"Data de fabricação": "",
"Fabricante": "",
"Número de tombamento": "",
"Matrícula (Equipamento)": "",
"Meio de isolação": "",
"Potência nominal (kVA) (Equipamento)": "",
"Quantidade de fases": "",
"Série": "",
"Tensão primária (KV)": "",
"Tensão secundária (KV)": "",
"Tipo de autoproteção": "",
"Tipo de ligação (Equipamento)": ""
}
"#;

pub const NAMEPLATE_CLOSING_PROMPT: &str = "Preencha os valores correspondentes em cada campo encontrados na placa da imagem. Tente raciocinar e fazer as aproximações entre as informaçãos. Se uma informação não estiver presente, deixe o valor como null, voce não é obrigado a responder todos os campos do formulário";

/// Full nameplate instruction with the OCR output spliced in
pub fn nameplate_prompt(ocr_text: &str) -> String {
    let mut prompt = String::with_capacity(
        NAMEPLATE_FORM_PROMPT.len() + ocr_text.len() + NAMEPLATE_CLOSING_PROMPT.len(),
    );
    prompt.push_str(NAMEPLATE_FORM_PROMPT);
    prompt.push_str(ocr_text);
    prompt.push_str(NAMEPLATE_CLOSING_PROMPT);
    prompt
}
