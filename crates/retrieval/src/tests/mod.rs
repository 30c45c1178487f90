mod lexical_ranking;
