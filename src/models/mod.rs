pub mod candidato;
