//! Prompt templates for the three model calls of a run.
//!
//! Prompts are written in Brazilian Portuguese; the verification vocabulary
//! (`CORRETO` / `INCORRETO` / `AJUSTAR`) is part of the contract with the
//! display layer.

/// Disclaimer every explanation must end with.
pub const DISCLAIMER: &str =
    "Esta é uma explicação geral. Sempre siga as orientações do seu médico.";

/// Ask for the comma-separated technical medical terms found in `text`.
pub fn term_extraction(text: &str) -> String {
    format!(
        "Analise este texto e extraia os termos médicos principais: \"{text}\"\n\
         Liste APENAS os termos separados por vírgula.\n\
         Ressalto: Caso não houver um termo MEDICINAL TÉCNICO, não retorne nada.\n\
         Ressalto: Este prompt é para analisar APENAS laudo médico. Se o texto não for \
         laudo médico, ou contiver apenas palavras soltas, não retorne nada.\n\
         Resposta:"
    )
}

/// Ask for a lay explanation of `term`.
pub fn explanation(term: &str) -> String {
    format!(
        "Aja como um médico experiente e didático. Explique o termo médico \"{term}\"\n\
         para um paciente leigo de forma clara, simples e empática.\n\
         \n\
         Inclua:\n\
         1. Definição simples\n\
         2. Causas comuns (se aplicável)\n\
         3. Importância para a saúde\n\
         4. Um aviso: \"{DISCLAIMER}\"\n\
         \n\
         Resposta:"
    )
}

/// Ask the model to grade `explanation` of `term`.
pub fn verification(term: &str, explanation: &str) -> String {
    format!(
        "Verifique se esta explicação médica está correta:\n\
         \n\
         Termo: {term}\n\
         Explicação: {explanation}\n\
         \n\
         Responda APENAS com:\n\
         - \"CORRETO\" se a explicação estiver precisa\n\
         - \"INCORRETO\" se houver erros graves\n\
         - \"AJUSTAR\" se precisar de pequenos ajustes\n\
         \n\
         Avaliação:"
    )
}
